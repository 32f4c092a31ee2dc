// Listener module
// Creates the TCP listener the tracker serves on

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Create a `TcpListener` with `SO_REUSEADDR` enabled.
///
/// `SO_REUSEADDR` lets a restarted server bind while old connections sit in
/// `TIME_WAIT`. `SO_REUSEPORT` is left off so a second server on the same
/// port fails with `AddrInUse` instead of silently sharing it.
///
/// Must be called from within a tokio runtime.
pub fn create_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    // socket2::Socket -> std::net::TcpListener -> tokio::net::TcpListener
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_bind_reports_addr_in_use() {
        let first = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.local_addr().unwrap();

        let err = create_listener(addr).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AddrInUse);
    }
}
