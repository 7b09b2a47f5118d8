//! HTML pages that drive a print job through the remote print API.

/// Page opened from disk once the print API port is known.
///
/// It loads the API script from `port` and prints on the operator's click.
pub fn detected_page(model: &str, port: u16, generated_at: &str) -> String {
    let model_html = escape_html(model);
    let model_js = escape_js(model);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{model_html} print test</title>
</head>
<body style="font-family: -apple-system, Helvetica, sans-serif; padding: 20px;">
    <h2>{model_html} connection test</h2>
    <div id="log" style="font-family: monospace; font-size: 12px;"></div>
    <button onclick="startTest()">Print test page</button>
    <script>
        var logDiv = document.getElementById('log');
        var scriptUrls = [
            'https://localhost:{port}/CLodopfuncs.js?priority=1',
            'https://localhost:{port}/CLodopfuncs.js',
            'http://localhost:{port}/CLodopfuncs.js?priority=1',
            'http://localhost:{port}/CLodopfuncs.js'
        ];
        var current = 0;

        function addLog(msg) {{
            logDiv.innerHTML += new Date().toLocaleTimeString() + ': ' + msg + '<br>';
        }}

        function findLodop() {{
            if (typeof getCLodop === 'function') return getCLodop();
            if (typeof window.CLODOP !== 'undefined') return window.CLODOP;
            if (typeof window.LODOP !== 'undefined') return window.LODOP;
            return null;
        }}

        function loadNextScript() {{
            if (current >= scriptUrls.length) {{
                addLog('Could not load the print API script from any address');
                return;
            }}
            var url = scriptUrls[current];
            addLog('Loading ' + url);
            var script = document.createElement('script');
            script.src = url;
            script.onload = function() {{
                addLog('Loaded ' + url);
                var lodop = findLodop();
                if (lodop && typeof lodop.PRINT_INIT === 'function') {{
                    addLog('Print API ready, version ' + (lodop.VERSION || 'unknown'));
                }} else {{
                    addLog('Print API object is missing or incomplete');
                }}
            }};
            script.onerror = function() {{
                addLog('Failed to load ' + url);
                current++;
                setTimeout(loadNextScript, 500);
            }};
            document.head.appendChild(script);
        }}

        function startTest() {{
            try {{
                var lodop = findLodop();
                if (!lodop) {{
                    addLog('Print API is not available');
                    return;
                }}
                lodop.PRINT_INIT('{model_js} test page');
                lodop.SET_PRINT_PAGESIZE(1, 0, 0, '80mm*120mm');
                lodop.ADD_PRINT_TEXT(50, 10, 200, 30, '{model_js} test page');
                lodop.ADD_PRINT_TEXT(100, 10, 300, 20, 'Time: {generated_at}');
                lodop.ADD_PRINT_TEXT(130, 10, 300, 20, 'Status: printer is working');
                lodop.ADD_PRINT_TEXT(160, 10, 300, 20, 'Network: tunnel established');
                lodop.ADD_PRINT_TEXT(190, 10, 300, 20, 'Port: {port}');
                var job = lodop.PRINT();
                addLog(job ? 'Print job sent: ' + job : 'Print job was rejected');
            }} catch (e) {{
                addLog('Print test failed: ' + e.message);
            }}
        }}

        window.onload = loadNextScript;
    </script>
</body>
</html>
"#
    )
}

/// Page served by the fallback HTTP server when the API could not be detected.
///
/// It prints automatically as soon as a script address loads.
pub fn fallback_page(model: &str, port: u16) -> String {
    let model_html = escape_html(model);
    let model_js = escape_js(model);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{model_html} print test</title>
</head>
<body style="font-family: -apple-system, Helvetica, sans-serif; padding: 20px;">
    <h2>{model_html} print test</h2>
    <div id="status">Loading...</div>
    <div id="debug" style="margin-top: 20px; padding: 10px; background: #f0f0f0; font-family: monospace; font-size: 12px;"></div>
    <p>If you can read this page, the local network path works. Make sure the print
    service is running on the remote Windows machine.</p>
    <script>
        function setStatus(html) {{ document.getElementById('status').innerHTML = html; }}
        function addDebug(msg) {{
            document.getElementById('debug').innerHTML += new Date().toLocaleTimeString() + ': ' + msg + '<br>';
        }}

        var urls = [
            'https://localhost:{port}/CLodopfuncs.js?priority=1',
            'https://localhost:{port}/CLodopfuncs.js',
            'http://localhost:{port}/CLodopfuncs.js',
            'http://localhost:{port}/CLodopfuncs'
        ];
        var index = 0;

        function tryNext() {{
            if (index >= urls.length) {{
                setStatus('<span style="color: red;">Could not load the print API script</span>');
                return;
            }}
            var url = urls[index];
            addDebug('Loading ' + url);
            var script = document.createElement('script');
            script.src = url;
            script.onload = function() {{ addDebug('Loaded ' + url); setTimeout(print, 1000); }};
            script.onerror = function() {{ addDebug('Failed ' + url); index++; setTimeout(tryNext, 500); }};
            document.head.appendChild(script);
        }}

        function print() {{
            try {{
                if (typeof getLodop === 'undefined') {{
                    setStatus('<span style="color: red;">getLodop is not defined</span>');
                    return;
                }}
                var lodop = getLodop();
                if (!lodop) {{
                    setStatus('<span style="color: red;">Print API object unavailable</span>');
                    return;
                }}
                lodop.PRINT_INIT('{model_js} test page');
                lodop.SET_PRINT_PAGESIZE(1, 0, 0, '80mm*120mm');
                lodop.ADD_PRINT_TEXT(20, 50, 200, 30, '{model_js} test page');
                lodop.SET_PRINT_STYLEA(0, 'FontSize', 14);
                lodop.SET_PRINT_STYLEA(0, 'Bold', 1);
                lodop.ADD_PRINT_TEXT(80, 50, 200, 20, 'Printer is working');
                lodop.ADD_PRINT_TEXT(110, 50, 200, 20, 'VPN connected');
                lodop.ADD_PRINT_TEXT(130, 50, 200, 20, 'Port forwarding active');
                lodop.ADD_PRINT_TEXT(180, 50, 200, 20, 'Printed ' + new Date().toLocaleString());
                lodop.PRINT();
                setStatus('<span style="color: green;">Print command sent; check the printer output</span>');
            }} catch (e) {{
                setStatus('<span style="color: red;">Print test failed: ' + e.message + '</span>');
            }}
        }}

        window.onload = tryNext;
    </script>
</body>
</html>
"#
    )
}

/// Escape text for HTML element content and attribute values.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape text for a single-quoted JavaScript string inside a `<script>` block.
fn escape_js(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\x3c"),
            '>' => out.push_str("\\x3e"),
            '&' => out.push_str("\\x26"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_page_targets_port() {
        let page = detected_page("HPRT TP80", 8443, "2026-10-17 09:30:00");
        assert!(page.contains("https://localhost:8443/CLodopfuncs.js?priority=1"));
        assert!(page.contains("Time: 2026-10-17 09:30:00"));
        assert!(page.contains("<title>HPRT TP80 print test</title>"));
    }

    #[test]
    fn test_fallback_page_targets_port() {
        let page = fallback_page("HPRT TP80", 8443);
        assert!(page.contains("http://localhost:8443/CLodopfuncs"));
        assert!(!page.contains("{port}"));
    }

    #[test]
    fn test_model_is_escaped() {
        let model = "TP80 </script><script>alert('x')</script> & \"co\"";
        for page in [
            detected_page(model, 8443, "2026-10-17 09:30:00"),
            fallback_page(model, 8443),
        ] {
            assert!(!page.contains("</script><script>"));
            assert!(!page.contains("alert('x')"));
            assert!(page.contains("<h2>TP80 &lt;/script&gt;&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; &quot;co&quot;"));
            assert!(page.contains("PRINT_INIT('TP80 \\x3c/script\\x3e\\x3cscript\\x3ealert(\\'x\\')"));
        }
    }
}
