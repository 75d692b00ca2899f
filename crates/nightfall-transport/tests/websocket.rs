//! Integration tests for the WebSocket transport over a real socket.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use nightfall_transport::{Connection, Transport, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on an OS-assigned port and returns the transport plus address.
    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address").to_string();
        (transport, addr)
    }

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_text_frames_flow_both_ways() {
        let (mut transport, addr) = bind().await;
        let accept = tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let mut client = connect_client(&addr).await;
        let server_conn = accept.await.expect("task should complete");
        assert!(server_conn.id().into_inner() > 0);

        server_conn
            .send(br#"{"event":"game_started"}"#)
            .await
            .expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "UTF-8 payloads go out as text frames");
        assert_eq!(msg.into_data().as_ref(), br#"{"event":"game_started"}"#);

        client.send(Message::text("hello")).await.unwrap();
        let received = server_conn.recv().await.unwrap().expect("should have data");
        assert_eq!(received, b"hello");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_binary_frames_are_received() {
        let (mut transport, addr) = bind().await;
        let accept = tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let mut client = connect_client(&addr).await;
        let server_conn = accept.await.unwrap();

        client
            .send(Message::Binary(vec![0xff, 0x00].into()))
            .await
            .unwrap();
        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, vec![0xff, 0x00]);
    }

    #[tokio::test]
    async fn test_send_does_not_wait_for_pending_recv() {
        let (mut transport, addr) = bind().await;
        let accept = tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let mut client = connect_client(&addr).await;
        let server_conn = std::sync::Arc::new(accept.await.unwrap());

        // Park a reader on the connection, then write from this task.
        let reader = {
            let conn = std::sync::Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::timeout(std::time::Duration::from_secs(2), server_conn.send(b"ping"))
            .await
            .expect("send must not block behind recv")
            .unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"ping");

        client.send(Message::Close(None)).await.unwrap();
        let result = reader.await.unwrap().unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind().await;
        let accept = tokio::spawn(async move { transport.accept().await.expect("should accept") });

        let mut client = connect_client(&addr).await;
        let server_conn = accept.await.unwrap();

        client.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }
}
