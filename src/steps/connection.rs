//! End-to-end connection test and print API detection.

use super::{test_page, Context, StepOutcome, StepResult};
use crate::constants;
use crate::error::StepError;
use std::fs;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Dial the tunnel at both ends, then locate the print API and open a test page.
pub fn test(ctx: &Context) -> StepResult {
    let config = &ctx.config;

    let local = SocketAddr::from(([127, 0, 0, 1], config.local_port));
    TcpStream::connect_timeout(&local, ctx.timings.local_dial_timeout).map_err(|e| {
        StepError::Network(format!(
            "local port {} is not accepting connections: {e}",
            config.local_port
        ))
    })?;
    ctx.reporter().info("Local forwarding port is reachable");

    dial_remote(
        &config.remote_host,
        config.remote_port,
        ctx.timings.remote_dial_timeout,
    )
    .map_err(|e| {
        StepError::Network(format!(
            "remote host {}:{} is unreachable: {e}",
            config.remote_host, config.remote_port
        ))
    })?;
    ctx.reporter().info("Remote host is reachable");

    let ports = candidate_ports(config.local_port);
    let detected = detect_port(&ports, |url| {
        ctx.http.status(url, ctx.timings.probe_timeout) == Some(200)
    });

    match detected {
        Some(port) => {
            ctx.reporter()
                .info(format!("Print API answered on port {port}"));
            open_test_page(ctx, port)?;
            Ok(StepOutcome::Done)
        }
        None => {
            let tried = ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            ctx.reporter().warn(format!(
                "Print API not found on ports {tried}; the remote print service may not be running, the printer may be off, or the VPN may be unstable"
            ));
            serve_fallback_page(ctx, constants::CLODOP_DEFAULT_PORT)?;
            Ok(StepOutcome::Warning(
                "print API not detected; a best-effort test page was sent to the browser".to_string(),
            ))
        }
    }
}

/// Configured port first, then the fallback list, without repeats.
pub fn candidate_ports(configured: u16) -> Vec<u16> {
    let mut ports = Vec::with_capacity(constants::CLODOP_FALLBACK_PORTS.len() + 1);
    for port in std::iter::once(configured).chain(constants::CLODOP_FALLBACK_PORTS) {
        if port != 0 && !ports.contains(&port) {
            ports.push(port);
        }
    }
    ports
}

/// First port for which any scheme and path answers; later ports are not probed.
pub fn detect_port(ports: &[u16], mut answers: impl FnMut(&str) -> bool) -> Option<u16> {
    ports.iter().copied().find(|port| {
        tracing::debug!(port, "probing print API");
        constants::CLODOP_SCHEMES.iter().any(|scheme| {
            constants::CLODOP_PATHS
                .iter()
                .any(|path| answers(&format!("{scheme}://localhost:{port}{path}")))
        })
    })
}

fn dial_remote(host: &str, port: u16, timeout: Duration) -> io::Result<()> {
    let mut last_error = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return Ok(()),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    }))
}

fn open_test_page(ctx: &Context, port: u16) -> Result<(), StepError> {
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let page = test_page::detected_page(&ctx.config.printer_model, port, &generated_at);
    let path = ctx.temp_dir.join(constants::TEST_PAGE_FILE_NAME);
    fs::write(&path, page)
        .map_err(|e| StepError::command("cannot write the test page", e.to_string()))?;

    ctx.reporter().info("Opening the print test page in the browser");
    ctx.opener
        .open(&path.to_string_lossy())
        .map_err(|e| StepError::command("cannot open the browser", e.to_string()))
}

/// Serve the fallback page on an ephemeral port for the linger period.
fn serve_fallback_page(ctx: &Context, api_port: u16) -> Result<(), StepError> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .and_then(|l| l.set_nonblocking(true).map(|()| l))
        .map_err(|e| StepError::command("cannot start the test page server", e.to_string()))?;
    let port = listener
        .local_addr()
        .map_err(|e| StepError::command("cannot start the test page server", e.to_string()))?
        .port();

    let page = test_page::fallback_page(&ctx.config.printer_model, api_port);
    let stop = Arc::new(AtomicBool::new(false));
    let server = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || serve(&listener, &page, &stop))
    };

    let url = format!("http://127.0.0.1:{port}/test");
    ctx.reporter().info(format!("Opening fallback test page {url}"));
    let opened = ctx.opener.open(&url);

    ctx.wait(ctx.timings.test_page_linger);
    stop.store(true, Ordering::Relaxed);
    let _ = server.join();

    opened.map_err(|e| StepError::command("cannot open the browser", e.to_string()))
}

fn serve(listener: &TcpListener, page: &str, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(e) = respond(stream, page) {
                    tracing::debug!(error = %e, "test page request failed");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                tracing::warn!(error = %e, "test page server stopped");
                return;
            }
        }
    }
}

fn respond(mut stream: TcpStream, page: &str) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;

    let mut buffer = [0u8; 2048];
    let read = stream.read(&mut buffer)?;
    let request = String::from_utf8_lossy(&buffer[..read]);
    let path = request.split_whitespace().nth(1).unwrap_or("/");

    let (status, body) = if path == "/test" {
        ("200 OK", page)
    } else {
        ("404 Not Found", "not found")
    };
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}
