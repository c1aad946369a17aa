//! HTTP サーバーの例 (threaded_tinyhttpd)
//!
//! 使い方:
//!   # デフォルトポート 9999 で起動
//!   cargo run -p tinyhttpd_demo
//!
//!   # ポートとワーカー数を指定
//!   cargo run -p tinyhttpd_demo -- --port 8080 --workers 16
//!
//! 動作確認:
//!   curl http://localhost:9999/
//!   curl "http://localhost:9999/search?q=rust&tag=a&tag=b"
//!   curl -d "name=John&email=j@example.com" http://localhost:9999/api/register
//!   curl -F "file=@Cargo.toml" -F "description=manifest" http://localhost:9999/api/upload

use threaded_tinyhttpd::{HandlerResult, Request, Response, ResponseSink, Server};

struct ServerOptions {
    port: u16,
    workers: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = parse_args()?;

    let mut server = Server::new().pool_size(options.workers);
    setup_handlers(&mut server);

    println!("HTTP server listening on http://0.0.0.0:{}", options.port);
    server.listen(options.port)?;
    Ok(())
}

fn parse_args() -> Result<ServerOptions, Box<dyn std::error::Error>> {
    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "tinyhttpd_demo";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --version フラグ
    let version_flag: bool = noargs::flag("version")
        .short('V')
        .doc("Show version")
        .take(&mut args)
        .is_present();
    if version_flag {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // --port オプション
    let port: u16 = noargs::opt("port")
        .short('p')
        .doc("Port to listen on (default: 9999)")
        .default("9999")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // --workers オプション
    let workers: usize = noargs::opt("workers")
        .short('w')
        .doc("Worker thread count (default: 64)")
        .default("64")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        std::process::exit(0);
    }

    Ok(ServerOptions { port, workers })
}

fn setup_handlers(server: &mut Server) {
    server.register("GET", "/", index);
    server.register("GET", "/styles.css", styles);
    server.register("GET", "/api/messages", list_messages);
    server.register("POST", "/api/messages", post_message);
    server.register("GET", "/search", search);
    server.register("GET", "/api/filter", filter);
    server.register("POST", "/api/register", register);
    server.register("POST", "/api/upload", upload);
}

fn index(_request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
    let body = r#"<!DOCTYPE html>
<html>
<head><title>tinyhttpd demo</title><link rel="stylesheet" href="/styles.css"></head>
<body>
<h1>Welcome to tinyhttpd demo</h1>
<ul>
<li><a href="/search?q=rust&tag=a&tag=b">/search</a> - Echo query parameters</li>
<li><a href="/api/messages">/api/messages</a> - Message API</li>
<li><a href="/api/filter?color=red&color=blue&size=L">/api/filter</a> - Echo all query parameters</li>
</ul>
</body>
</html>
"#;

    sink.send(
        &Response::new(200, "OK")
            .header("Content-Type", "text/html; charset=utf-8")
            .body(body.as_bytes().to_vec()),
    )?;
    Ok(())
}

/// 静的ファイルをディスクから配信する
fn styles(_request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
    serve_file(sink, "demos/tinyhttpd_demo/assets/styles.css", "text/css")
}

fn serve_file(sink: &mut ResponseSink<'_>, path: &str, content_type: &str) -> HandlerResult {
    match std::fs::read(path) {
        Ok(content) => {
            sink.send(
                &Response::new(200, "OK")
                    .header("Content-Type", content_type)
                    .body(content),
            )?;
        }
        Err(_) => {
            send_error(sink, 404, &format!("File not found: {}", path))?;
        }
    }
    Ok(())
}

fn list_messages(_request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
    let body = r#"[{"id":1,"text":"Hello"},{"id":2,"text":"World"}]"#;
    send_json(sink, 200, body)
}

fn post_message(request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
    let body = request.body_str().unwrap_or("");
    let response = format!(
        "{{\"status\":\"ok\",\"message\":\"Message received: {}\"}}",
        body
    );
    send_json(sink, 200, &response)
}

fn search(request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
    let q = request.query_param("q").unwrap_or("");
    let limit = request.query_param("limit").unwrap_or("");
    let tags = request.query_params("tag");

    let body = format!(
        "{{\"q\":\"{}\",\"limit\":\"{}\",\"tags\":{}}}",
        q,
        limit,
        json_string_array(&tags)
    );
    send_json(sink, 200, &body)
}

fn filter(request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
    let params = request.all_query_params();

    let mut body = String::from("{");
    for (i, name) in params.names().iter().enumerate() {
        if i > 0 {
            body.push(',');
        }
        body.push_str(&format!(
            "\"{}\":{}",
            name,
            json_string_array(&params.all(name))
        ));
    }
    body.push('}');

    send_json(sink, 200, &body)
}

fn register(request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
    let name = request.post_param("name").unwrap_or("");
    let email = request.post_param("email").unwrap_or("");
    let roles = request.post_params("role");

    let body = format!(
        "{{\"name\":\"{}\",\"email\":\"{}\",\"roles\":{}}}",
        name,
        email,
        json_string_array(&roles)
    );
    send_json(sink, 201, &body)
}

fn upload(request: &Request, sink: &mut ResponseSink<'_>) -> HandlerResult {
    let file = request.form_part("file");
    let description = request
        .form_part("description")
        .and_then(|part| part.content_str())
        .unwrap_or("");

    match file {
        Some(part) if part.is_file() => {
            let body = format!(
                "{{\"filename\":\"{}\",\"size\":{},\"description\":\"{}\"}}",
                part.filename().unwrap_or(""),
                part.size(),
                description
            );
            send_json(sink, 201, &body)
        }
        _ => send_error(sink, 400, "File not provided"),
    }
}

fn send_json(sink: &mut ResponseSink<'_>, status_code: u16, body: &str) -> HandlerResult {
    let reason = reason_phrase(status_code);
    sink.send(
        &Response::new(status_code, reason)
            .header("Content-Type", "application/json")
            .body(body.as_bytes().to_vec()),
    )?;
    Ok(())
}

fn send_error(sink: &mut ResponseSink<'_>, status_code: u16, message: &str) -> HandlerResult {
    sink.send(
        &Response::new(status_code, reason_phrase(status_code))
            .header("Content-Type", "text/plain")
            .body(message.as_bytes().to_vec()),
    )?;
    Ok(())
}

fn reason_phrase(status_code: u16) -> &'static str {
    match status_code {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Error",
    }
}

fn json_string_array(values: &[&str]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
    format!("[{}]", quoted.join(","))
}
