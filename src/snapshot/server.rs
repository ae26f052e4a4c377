//! # 快照请求/应答服务
//!
//! 基于 TCP 的行协议：客户端每发送一行请求，服务端恰好回复一行。
//!
//! ## 协议
//! - `__GET__`: 回复最近特征记录的 JSON（无记录时为 `{}`）
//! - `__STOP__`: 回复 `stopping` 并停止服务
//! - 其他: 回复 `unrecognized request: <token>`
//!
//! 连接按顺序逐个处理；监听与读取都以 100 ms 为周期轮询停止标志。
//!
//! ## 依赖关系
//! - 被 `commands/serve.rs` 使用
//! - 使用 `snapshot/store.rs`

use crate::error::{EspecError, Result};
use crate::snapshot::store::SnapshotStore;

use log::{debug, info, warn};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const GET_TOKEN: &str = "__GET__";
pub const STOP_TOKEN: &str = "__STOP__";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 单个请求的应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 快照内容
    Snapshot(String),
    /// 停止服务
    Stopping,
    /// 无法识别的请求
    Unrecognized(String),
}

impl Reply {
    /// 应答文本
    pub fn text(&self) -> String {
        match self {
            Reply::Snapshot(payload) => payload.clone(),
            Reply::Stopping => "stopping".to_string(),
            Reply::Unrecognized(token) => format!("unrecognized request: {token}"),
        }
    }
}

/// 处理一个请求令牌
pub fn respond(store: &SnapshotStore, token: &str) -> Result<Reply> {
    match token.trim() {
        GET_TOKEN => Ok(Reply::Snapshot(store.to_json()?)),
        STOP_TOKEN => Ok(Reply::Stopping),
        other => Ok(Reply::Unrecognized(other.to_string())),
    }
}

/// 快照服务
pub struct SnapshotServer {
    listener: TcpListener,
    address: SocketAddr,
    store: SnapshotStore,
    name: String,
}

impl SnapshotServer {
    /// 绑定监听地址
    pub fn bind(address: &str, store: SnapshotStore, name: &str) -> Result<Self> {
        let server_error = |source| EspecError::ServerError {
            address: address.to_string(),
            source,
        };
        let listener = TcpListener::bind(address).map_err(server_error)?;
        listener.set_nonblocking(true).map_err(server_error)?;
        let address = listener.local_addr().map_err(server_error)?;
        Ok(Self {
            listener,
            address,
            store,
            name: name.to_string(),
        })
    }

    /// 在后台线程运行服务
    pub fn spawn(self) -> ServerHandle {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let address = self.address;
        let thread = thread::spawn(move || self.run(&flag));
        ServerHandle {
            running,
            address,
            thread,
        }
    }

    /// 阻塞运行，直到收到 `__STOP__` 或停止标志被清除
    pub fn run(self, running: &AtomicBool) -> Result<()> {
        info!("[snapshot {}] running on {}", self.name, self.address);

        while running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!("[snapshot {}] connection from {}", self.name, peer);
                    match self.serve_connection(stream, running) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => warn!("[snapshot {}] connection from {} failed: {}", self.name, peer, e),
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(EspecError::ServerError {
                        address: self.address.to_string(),
                        source: e,
                    })
                }
            }
        }

        running.store(false, Ordering::SeqCst);
        info!("[snapshot {}] stopped", self.name);
        Ok(())
    }

    /// 处理一个连接上的所有请求，收到停止请求时返回 `true`
    fn serve_connection(&self, stream: TcpStream, running: &AtomicBool) -> std::io::Result<bool> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);
        let mut line = String::new();

        while running.load(Ordering::SeqCst) {
            match reader.read_line(&mut line) {
                Ok(0) => return Ok(false),
                Ok(_) => {
                    let token = line.trim_end_matches(['\r', '\n']).to_string();
                    line.clear();
                    info!("[snapshot {}] received '{}'", self.name, token);

                    let reply = respond(&self.store, &token).unwrap_or_else(|e| {
                        warn!("[snapshot {}] failed to serialize snapshot: {}", self.name, e);
                        Reply::Snapshot("{}".to_string())
                    });
                    writer.write_all(reply.text().as_bytes())?;
                    writer.write_all(b"\n")?;
                    writer.flush()?;

                    if reply == Reply::Stopping {
                        return Ok(true);
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }
}

/// 后台服务句柄
pub struct ServerHandle {
    running: Arc<AtomicBool>,
    address: SocketAddr,
    thread: JoinHandle<Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// 服务是否仍在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.thread.is_finished()
    }

    /// 清除停止标志并等待服务线程退出
    pub fn stop(self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.wait()
    }

    /// 因处理错误中止服务，返回原错误
    ///
    /// 停止失败只记录警告。
    pub fn stop_with(self, error: EspecError) -> EspecError {
        if let Err(stop_err) = self.stop() {
            warn!("snapshot server did not stop cleanly: {}", stop_err);
        }
        error
    }

    /// 等待服务线程退出（例如收到 `__STOP__`）
    pub fn wait(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|_| EspecError::Other("snapshot server thread panicked".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureRecord;

    fn request(address: SocketAddr, token: &str) -> Result<String> {
        let client_error = |source| EspecError::ServerError {
            address: address.to_string(),
            source,
        };
        let mut stream = TcpStream::connect(address).map_err(client_error)?;
        stream
            .write_all(format!("{token}\n").as_bytes())
            .map_err(client_error)?;
        let mut reply = String::new();
        BufReader::new(stream)
            .read_line(&mut reply)
            .map_err(client_error)?;
        Ok(reply.trim_end().to_string())
    }

    #[test]
    fn test_respond_tokens() {
        let store = SnapshotStore::new();
        assert_eq!(
            respond(&store, "__GET__").unwrap(),
            Reply::Snapshot("{}".to_string())
        );
        assert_eq!(respond(&store, "__STOP__\n").unwrap(), Reply::Stopping);
        assert_eq!(
            respond(&store, "what is in the dict").unwrap().text(),
            "unrecognized request: what is in the dict"
        );
    }

    #[test]
    fn test_server_round_trip_and_stop() {
        let store = SnapshotStore::new();
        let server = SnapshotServer::bind("127.0.0.1:0", store.clone(), "test").unwrap();
        let handle = server.spawn();
        let address = handle.local_addr();

        assert_eq!(request(address, GET_TOKEN).unwrap(), "{}");

        store.publish(FeatureRecord {
            mean_energy: 55.5,
            std_energy: 2.0,
            shot_number: 9,
        });
        let payload = request(address, GET_TOKEN).unwrap();
        let json: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(json["Shot number"], 9);

        assert!(request(address, "hello").unwrap().starts_with("unrecognized"));
        assert_eq!(request(address, STOP_TOKEN).unwrap(), "stopping");
        handle.wait().unwrap();
    }

    #[test]
    fn test_local_stop() {
        let server = SnapshotServer::bind("127.0.0.1:0", SnapshotStore::new(), "test").unwrap();
        let handle = server.spawn();
        assert!(handle.is_running());
        handle.stop().unwrap();
    }

    #[test]
    fn test_stop_with_keeps_processing_error() {
        let handle = ServerHandle {
            running: Arc::new(AtomicBool::new(true)),
            address: "127.0.0.1:0".parse().unwrap(),
            thread: thread::spawn(|| Err(EspecError::Other("listener failed".to_string()))),
        };
        let error = handle.stop_with(EspecError::InvalidConfig("bad spacing".to_string()));
        assert!(matches!(error, EspecError::InvalidConfig(ref msg) if msg == "bad spacing"));

        let server = SnapshotServer::bind("127.0.0.1:0", SnapshotStore::new(), "test").unwrap();
        let error = server.spawn().stop_with(EspecError::DegenerateWeighting);
        assert!(matches!(error, EspecError::DegenerateWeighting));
    }
}
