//! A2S_INFO exchanges against a fake game server on loopback.

use ipwatch_bot::commands::server::server_field;
use ipwatch_bot::integrations::query::{build_request, QueryClient};
use std::net::UdpSocket;
use std::thread;
use std::time::{Duration, Instant};

const CHALLENGE: [u8; 4] = [0x0A, 0x0B, 0x0C, 0x0D];

fn info_reply(name: &str, players: u8, max_players: u8) -> Vec<u8> {
    let mut packet = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x49, 17];
    for s in [name, "gm_construct", "garrysmod", "Sandbox"] {
        packet.extend_from_slice(s.as_bytes());
        packet.push(0);
    }
    packet.extend_from_slice(&4000u16.to_le_bytes());
    packet.extend_from_slice(&[players, max_players, 0]);
    packet
}

/// Answers the first request with a challenge and the challenged request with
/// server info. Returns the port it listens on.
fn spawn_challenging_server(name: &'static str, players: u8, max_players: u8) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();

    thread::spawn(move || {
        let mut buf = [0u8; 1400];
        for _ in 0..2 {
            let (len, from) = socket.recv_from(&mut buf).unwrap();
            let request = &buf[..len];
            if request == build_request(None).as_slice() {
                let mut reply = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x41];
                reply.extend_from_slice(&CHALLENGE);
                socket.send_to(&reply, from).unwrap();
            } else if request == build_request(Some(CHALLENGE)).as_slice() {
                socket
                    .send_to(&info_reply(name, players, max_players), from)
                    .unwrap();
                return;
            }
        }
    });

    port
}

#[tokio::test]
async fn info_follows_challenge_and_parses_reply() {
    let port = spawn_challenging_server("Build Server", 7, 32);
    let client = QueryClient::new("127.0.0.1", port, Duration::from_secs(2));

    let info = client.info().await.unwrap();

    assert_eq!(info.name, "Build Server");
    assert_eq!(info.players, 7);
    assert_eq!(info.max_players, 32);
    assert_eq!(info.map, "gm_construct");
    assert_eq!(
        server_field(&Ok(info)),
        "Build Server: 7/32 players on gm_construct"
    );
}

#[tokio::test]
async fn silent_server_times_out_and_reads_as_down() {
    // bound but never answers
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = silent.local_addr().unwrap().port();
    let client = QueryClient::new("127.0.0.1", port, Duration::from_secs(5))
        .with_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let result = client.info().await;

    assert!(result.as_ref().unwrap_err().is_timeout());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(server_field(&result), "Server is currently down");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_query_does_not_block_other_tasks() {
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = silent.local_addr().unwrap().port();
    let client = QueryClient::new("127.0.0.1", port, Duration::from_millis(500));

    let query = tokio::spawn(async move { client.info().await });
    let ticker = tokio::spawn(async {
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(50)).await;
        started.elapsed()
    });

    let ticked_after = ticker.await.unwrap();
    assert!(ticked_after < Duration::from_millis(400));
    assert!(query.await.unwrap().unwrap_err().is_timeout());
}
