//! 通过真实 TCP 连接走完整局流程

use std::time::Duration;

use tokio::time::timeout;

use caro_server::{Server, ServerConfig};
use protocol::{
    ClientMessage, Connection, Connector, ErrorCode, MoveOutcome, NetworkConfig, PlayerId,
    RoomId, ServerMessage, TcpConnection, TcpConnector,
};

async fn start_server() -> String {
    let config = ServerConfig {
        network: NetworkConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        ..ServerConfig::default()
    };
    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve(std::future::pending()));
    addr
}

struct Client {
    conn: TcpConnection,
    id: PlayerId,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let mut conn = TcpConnector.connect(addr).await.unwrap();
        let id = match recv(&mut conn).await {
            ServerMessage::Welcome { player_id } => player_id,
            other => panic!("expected welcome, got {:?}", other),
        };
        Self { conn, id }
    }

    async fn send(&mut self, msg: ClientMessage) {
        self.conn.send(&msg).await.unwrap();
    }

    async fn recv(&mut self) -> ServerMessage {
        recv(&mut self.conn).await
    }
}

async fn recv(conn: &mut TcpConnection) -> ServerMessage {
    timeout(Duration::from_secs(5), conn.recv())
        .await
        .expect("timed out waiting for server")
        .unwrap()
}

/// 双方入座并开局，按先后手返回
async fn paired(addr: &str) -> (Client, Client, RoomId) {
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    host.send(ClientMessage::CreateRoom).await;
    let room_id = match host.recv().await {
        ServerMessage::RoomCreated { room_id } => room_id,
        other => panic!("unexpected {:?}", other),
    };

    guest.send(ClientMessage::JoinRoom { room_id: room_id.clone() }).await;
    assert_eq!(guest.recv().await, ServerMessage::RoomJoined { room_id: room_id.clone() });

    let (host_first, host_symbol) = match host.recv().await {
        ServerMessage::MatchStarted { you, opponent, symbol, first_turn } => {
            assert_eq!(you, host.id);
            assert_eq!(opponent, guest.id);
            (first_turn, symbol)
        }
        other => panic!("unexpected {:?}", other),
    };
    match guest.recv().await {
        ServerMessage::MatchStarted { you, symbol, first_turn, .. } => {
            assert_eq!(you, guest.id);
            assert_ne!(symbol, host_symbol);
            assert_eq!(first_turn, host_first);
        }
        other => panic!("unexpected {:?}", other),
    }

    if host_first == host.id {
        (host, guest, room_id)
    } else {
        (guest, host, room_id)
    }
}

#[tokio::test]
async fn test_lobby_listing() {
    let addr = start_server().await;
    let mut a = Client::connect(&addr).await;
    let mut b = Client::connect(&addr).await;
    assert_ne!(a.id, b.id);

    b.send(ClientMessage::ListRooms).await;
    assert_eq!(b.recv().await, ServerMessage::RoomList { rooms: vec![] });

    a.send(ClientMessage::CreateRoom).await;
    let room_id = match a.recv().await {
        ServerMessage::RoomCreated { room_id } => room_id,
        other => panic!("unexpected {:?}", other),
    };

    b.send(ClientMessage::ListRooms).await;
    assert_eq!(b.recv().await, ServerMessage::RoomList { rooms: vec![room_id] });

    b.send(ClientMessage::JoinRoom { room_id: "NOPE42".to_string() }).await;
    assert!(matches!(
        b.recv().await,
        ServerMessage::Error { kind: ErrorCode::RoomNotFound, .. }
    ));
}

#[tokio::test]
async fn test_full_match_and_rematch() {
    let addr = start_server().await;
    let (mut first, mut second, _room_id) = paired(&addr).await;

    // 后手抢先被拒，对手收不到任何消息
    second.send(ClientMessage::Move { x: 0, y: 0 }).await;
    assert!(matches!(
        second.recv().await,
        ServerMessage::Error { kind: ErrorCode::NotYourTurn, .. }
    ));

    for i in 0..4 {
        first.send(ClientMessage::Move { x: i, y: 0 }).await;
        for c in [&mut first, &mut second] {
            assert!(matches!(c.recv().await, ServerMessage::MoveApplied { terminal: MoveOutcome::Continue, .. }));
        }
        second.send(ClientMessage::Move { x: i, y: 1 }).await;
        for c in [&mut first, &mut second] {
            assert!(matches!(c.recv().await, ServerMessage::MoveApplied { terminal: MoveOutcome::Continue, .. }));
        }
    }

    first.send(ClientMessage::Move { x: 4, y: 0 }).await;
    let winner = first.id;
    for c in [&mut first, &mut second] {
        match c.recv().await {
            ServerMessage::MoveApplied { x: 4, y: 0, by, terminal: MoveOutcome::Win, .. } => {
                assert_eq!(by, winner);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    second.send(ClientMessage::Move { x: 9, y: 9 }).await;
    assert!(matches!(
        second.recv().await,
        ServerMessage::Error { kind: ErrorCode::MatchFinished, .. }
    ));

    // 再来一局
    second.send(ClientMessage::RematchVote { agree: true }).await;
    assert_eq!(first.recv().await, ServerMessage::RematchRequested { from: second.id });
    first.send(ClientMessage::RematchVote { agree: true }).await;

    let a = first.recv().await;
    let b = second.recv().await;
    assert_eq!(a, b);
    match a {
        ServerMessage::MatchRestarted { first_turn } => {
            assert!(first_turn == first.id || first_turn == second.id);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_and_unknown_code() {
    let addr = start_server().await;
    let (mut first, mut second, _room_id) = paired(&addr).await;

    first.send(ClientMessage::Chat { text: "chào bạn".to_string() }).await;
    assert_eq!(
        second.recv().await,
        ServerMessage::Chat {
            from: first.id,
            text: "chào bạn".to_string()
        }
    );

    first.send(ClientMessage::Chat { text: "   ".to_string() }).await;
    assert!(matches!(
        first.recv().await,
        ServerMessage::Error { kind: ErrorCode::InvalidChat, .. }
    ));

    // 未知消息类型只回复错误，连接保持
    let (mut reader, mut writer) = first.conn.split();
    writer
        .write_frame_bytes(br#"{"code":"teleport","payload":{"x":1}}"#)
        .await
        .unwrap();
    let reply: ServerMessage = timeout(Duration::from_secs(5), reader.read_frame())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(reply, ServerMessage::Error { kind: ErrorCode::UnknownCode, .. }));

    writer.write_frame(&ClientMessage::Ping).await.unwrap();
    let reply: ServerMessage = timeout(Duration::from_secs(5), reader.read_frame())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply, ServerMessage::Pong);
}

#[tokio::test]
async fn test_draw_offer_accepted() {
    let addr = start_server().await;
    let (mut first, mut second, _room_id) = paired(&addr).await;

    first.send(ClientMessage::DrawOffer).await;
    assert_eq!(second.recv().await, ServerMessage::DrawRequested { from: first.id });

    second.send(ClientMessage::DrawAccept).await;
    assert_eq!(first.recv().await, ServerMessage::DrawAccepted);
    assert_eq!(second.recv().await, ServerMessage::DrawAccepted);

    first.send(ClientMessage::Move { x: 0, y: 0 }).await;
    assert!(matches!(
        first.recv().await,
        ServerMessage::Error { kind: ErrorCode::MatchFinished, .. }
    ));
}

#[tokio::test]
async fn test_disconnect_notifies_opponent() {
    let addr = start_server().await;
    let (mut first, second, room_id) = paired(&addr).await;
    let gone = second.id;

    drop(second);
    assert_eq!(first.recv().await, ServerMessage::OpponentLeft { player_id: gone });

    // 房间回到等待状态，可被列出
    first.send(ClientMessage::ListRooms).await;
    assert_eq!(first.recv().await, ServerMessage::RoomList { rooms: vec![room_id.clone()] });

    first.send(ClientMessage::LeaveRoom).await;
    assert_eq!(first.recv().await, ServerMessage::RoomLeft);

    first.send(ClientMessage::ListRooms).await;
    assert_eq!(first.recv().await, ServerMessage::RoomList { rooms: vec![] });
}
