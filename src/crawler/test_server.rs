// src/crawler/test_server.rs
use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// リクエストターゲット (パス + クエリ) ごとに固定の本文を返すローカル HTTP サーバー
/// 登録されていないターゲットは 404 を返す
pub(super) async fn serve(routes: Vec<(&str, Vec<u8>)>) -> String {
    let routes: Arc<HashMap<String, Vec<u8>>> = Arc::new(
        routes
            .into_iter()
            .map(|(target, body)| (target.to_string(), body))
            .collect(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let target = request.split_whitespace().nth(1).unwrap_or("/");

                let (status, body) = match routes.get(target) {
                    Some(body) => ("200 OK", body.clone()),
                    None => ("404 Not Found", b"not found".to_vec()),
                };
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// ソース URL だけを差し替えたイベント設定
pub(super) fn event_at(base: &str, template: &crate::events::EventConfig) -> crate::events::EventConfig {
    crate::events::EventConfig {
        source_url: Box::leak(format!("{}/", base).into_boxed_str()),
        ..*template
    }
}
