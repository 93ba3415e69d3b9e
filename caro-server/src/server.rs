//! 服务器主逻辑
//!
//! 每个连接一个会话循环：按到达顺序读帧、解码、分发；
//! 另有一个写任务把发送队列里的消息写回套接字。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use protocol::{
    ClientMessage, DecodeError, ErrorCode, FrameReader, FrameWriter, Listener, PlayerId,
    ProtocolError, ServerMessage, TcpListener,
};

use crate::config::ServerConfig;
use crate::directory::RoomDirectory;
use crate::error::RoomError;
use crate::player::{Player, PlayerIdGenerator};
use crate::room::Departure;

/// 服务器状态
pub struct ServerState {
    pub directory: RoomDirectory,
    pub config: ServerConfig,
    player_ids: PlayerIdGenerator,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            directory: RoomDirectory::new(),
            config,
            player_ids: PlayerIdGenerator::new(),
        }
    }

    /// 为新连接分配玩家 ID 与发送队列
    pub fn register_player(&self) -> (Player, mpsc::Receiver<ServerMessage>) {
        Player::channel(self.player_ids.next(), self.config.outbound_queue_capacity)
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 处理客户端消息
    ///
    /// 成功时的通知由房间在锁内投递；失败只回复请求方。
    pub fn handle(state: &ServerState, player: &Player, msg: ClientMessage) {
        let player_id = player.id();
        debug!("玩家 {} 发送 {}", player_id, msg.code());

        let result = match msg {
            ClientMessage::CreateRoom => state.directory.create_room(player).map(|_| ()),
            ClientMessage::JoinRoom { room_id } => state.directory.join_room(player, &room_id),
            ClientMessage::ListRooms => {
                player.post(ServerMessage::RoomList {
                    rooms: state.directory.list_waiting(),
                });
                Ok(())
            }
            ClientMessage::LeaveRoom => state
                .directory
                .leave(player_id, Departure::Left)
                .map(|_| ()),
            ClientMessage::Chat { text } => state
                .directory
                .with_room(player_id, |room| room.chat(player_id, text)),
            ClientMessage::Move { x, y } => state
                .directory
                .with_room(player_id, |room| room.make_move(player_id, x, y)),
            ClientMessage::RematchVote { agree } => state.directory.with_room(player_id, |room| {
                room.rematch_vote(player_id, agree, &mut rand::thread_rng())
            }),
            ClientMessage::DrawOffer => state
                .directory
                .with_room(player_id, |room| room.offer_draw(player_id)),
            ClientMessage::DrawAccept => state
                .directory
                .with_room(player_id, |room| room.accept_draw(player_id)),
            ClientMessage::DrawReject => state
                .directory
                .with_room(player_id, |room| room.reject_draw(player_id)),
            ClientMessage::Ping => {
                player.post(ServerMessage::Pong);
                Ok(())
            }
        };

        if let Err(e) = result {
            Self::reject(player, e);
        }
    }

    /// 回复错误，只发给请求方
    fn reject(player: &Player, error: RoomError) {
        debug!("玩家 {} 请求被拒绝: {}", player.id(), error);
        player.post(ServerMessage::error(error.code(), error.to_string()));
    }

    /// 回复无法识别的消息
    pub fn handle_decode_error(player: &Player, error: &DecodeError) {
        warn!("玩家 {} 消息无法识别: {}", player.id(), error);
        let kind = match error {
            DecodeError::MalformedPayload { .. } => ErrorCode::MalformedPayload,
            DecodeError::UnknownCode(_) | DecodeError::Envelope(_) | DecodeError::Body(_) => {
                ErrorCode::UnknownCode
            }
        };
        player.post(ServerMessage::error(kind, error.to_string()));
    }

    /// 处理玩家断线：离开所在房间，通知对手
    pub fn handle_disconnect(state: &ServerState, player_id: PlayerId) {
        match state.directory.leave(player_id, Departure::Disconnected) {
            Ok(room_id) => info!("玩家 {} 断线，已离开房间 {}", player_id, room_id),
            Err(_) => debug!("玩家 {} 断线，不在任何房间", player_id),
        }
    }
}

/// 读取下一帧；`idle` 为 None 时不设超时，超时返回 None
async fn next_frame<R>(
    reader: &mut FrameReader<R>,
    idle: Option<Duration>,
) -> Option<protocol::Result<&[u8]>>
where
    R: AsyncRead + Unpin + Send,
{
    match idle {
        Some(limit) => timeout(limit, reader.read_frame_bytes()).await.ok(),
        None => Some(reader.read_frame_bytes().await),
    }
}

/// 单个连接的会话循环
///
/// 读到连接断开、心跳超时、致命协议错误或被踢出时结束，并且只做一次断线清理。
/// 心跳超时只对发送过 ping 的连接生效，不发心跳的客户端可以无限期思考。
pub async fn run_session<R, W>(
    state: Arc<ServerState>,
    mut reader: FrameReader<R>,
    writer: FrameWriter<W>,
    peer: Option<String>,
) where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (player, outbound) = state.register_player();
    let player_id = player.id();
    let writer_task = tokio::spawn(write_loop(player_id, writer, outbound));
    let writer_abort = writer_task.abort_handle();

    info!("玩家 {} 已连接 ({})", player_id, peer.as_deref().unwrap_or("unknown"));
    player.post(ServerMessage::Welcome { player_id });

    let mut heartbeat: Option<Duration> = None;
    loop {
        let frame = tokio::select! {
            frame = next_frame(&mut reader, heartbeat) => frame,
            _ = player.kicked() => {
                warn!("玩家 {} 被踢出", player_id);
                break;
            }
        };

        let bytes = match frame {
            Some(Ok(bytes)) => bytes,
            Some(Err(ProtocolError::ConnectionClosed)) => {
                debug!("玩家 {} 关闭连接", player_id);
                break;
            }
            Some(Err(e)) => {
                warn!("玩家 {} 连接错误: {}", player_id, e);
                break;
            }
            None => {
                warn!("玩家 {} 心跳超时", player_id);
                break;
            }
        };

        match ClientMessage::decode(bytes) {
            Ok(msg) => {
                if msg == ClientMessage::Ping && heartbeat.is_none() {
                    debug!("玩家 {} 启用心跳检测", player_id);
                    heartbeat = Some(state.config.heartbeat_timeout());
                }
                MessageHandler::handle(&state, &player, msg)
            }
            Err(e) if e.is_fatal() => {
                warn!("玩家 {} 发送了无法解析的帧，断开连接: {}", player_id, e);
                break;
            }
            Err(e) => MessageHandler::handle_decode_error(&player, &e),
        }
    }

    MessageHandler::handle_disconnect(&state, player_id);
    drop(player);

    // 房间已不再持有句柄，队列关闭后写任务自行退出
    if timeout(Duration::from_secs(1), writer_task).await.is_err() {
        debug!("玩家 {} 写任务未及时结束，强制终止", player_id);
        writer_abort.abort();
    }
    info!("玩家 {} 会话结束", player_id);
}

/// 把发送队列写回连接
async fn write_loop<W>(
    player_id: PlayerId,
    mut writer: FrameWriter<W>,
    mut outbound: mpsc::Receiver<ServerMessage>,
) where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(msg) = outbound.recv().await {
        if let Err(e) = writer.write_frame(&msg).await {
            debug!("玩家 {} 写入失败: {}", player_id, e);
            return;
        }
    }
    let _ = writer.shutdown().await;
}

/// TCP 服务器
pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl Server {
    /// 绑定监听地址
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let addr = config.network.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("无法监听 {}", addr))?;
        Ok(Self {
            listener,
            state: Arc::new(ServerState::new(config)),
        })
    }

    /// 实际监听地址
    pub fn local_addr(&self) -> Option<String> {
        self.listener.local_addr()
    }

    /// 共享状态
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// 运行直到 Ctrl-C
    pub async fn run(self) -> Result<()> {
        self.serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("无法监听退出信号: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// 接受连接直到 shutdown 完成
    pub async fn serve<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        info!("服务器监听于 {}", self.local_addr().unwrap_or_default());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept_with_addr() => match accepted {
                    Ok((conn, peer)) => {
                        let (reader, writer) = conn.split();
                        tokio::spawn(run_session(Arc::clone(&self.state), reader, writer, peer));
                    }
                    Err(e) => warn!("接受连接失败: {}", e),
                },
                _ = &mut shutdown => {
                    info!("服务器关闭");
                    return Ok(());
                }
            }
        }
    }
}
