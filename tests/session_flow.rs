//! End-to-end session tests against a scripted server.
//!
//! Each test binds a local listener, accepts the engine's connection,
//! and plays the server side of the conversation line by line, asserting
//! on the structured events the engine emits.
//!
//! Run with: `cargo test --test session_flow`

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

use irc_session::{Client, Config, Event, EventStream};

/// Server side of one scripted connection.
struct ScriptedServer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ScriptedServer {
    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .expect("server write");
    }

    async fn recv(&mut self) -> String {
        let mut line = String::new();
        timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("server read timed out")
            .expect("server read");
        line.trim_end().to_string()
    }

    /// Read and discard the fixed registration greeting.
    async fn expect_greeting(&mut self, nick: &str) {
        assert_eq!(self.recv().await, "PROTOCTL UHNAMES NAMESX");
        assert_eq!(self.recv().await, format!("NICK {}", nick));
        assert!(self.recv().await.starts_with("USER "));
    }
}

/// Connect a client with flood protection off (tests that need the
/// queue enable it explicitly) and hand back both halves.
async fn connect(config_tweak: impl FnOnce(&mut Config)) -> (Client, EventStream, ScriptedServer) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let mut config = Config {
        nickname: "bob".to_string(),
        alternate: "bob2".to_string(),
        flood_protection: false,
        ..Config::new("127.0.0.1", addr.port())
    };
    config_tweak(&mut config);

    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        stream
    });
    let (client, events) = Client::connect(config).await.expect("client connect");
    let stream = accept.await.expect("accept join");
    let (read_half, write_half) = stream.into_split();

    (
        client,
        events,
        ScriptedServer {
            reader: BufReader::new(read_half),
            writer: write_half,
        },
    )
}

/// Next event that is not a heartbeat tick.
async fn next_event(events: &mut EventStream) -> Event {
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event timed out")
            .expect("event stream ended early");
        if !matches!(event, Event::Tick { .. }) {
            return event;
        }
    }
}

#[tokio::test]
async fn registers_and_reports_connection_events() {
    let (client, mut events, mut server) = connect(|_| {}).await;

    assert!(matches!(
        next_event(&mut events).await,
        Event::Connected { ref server, port } if server == "127.0.0.1" && port > 0
    ));

    server.expect_greeting("bob").await;
    server.send(":srv 001 bob :Welcome to the test net").await;
    assert!(matches!(
        next_event(&mut events).await,
        Event::Registered { .. }
    ));

    client.stop().await;
}

#[tokio::test]
async fn answers_ping_with_pong() {
    let (client, mut events, mut server) = connect(|_| {}).await;
    next_event(&mut events).await; // Connected
    server.expect_greeting("bob").await;

    server.send("PING :challenge-token").await;
    assert!(matches!(next_event(&mut events).await, Event::Ping { .. }));
    assert_eq!(server.recv().await, "PONG :challenge-token");

    client.stop().await;
}

#[tokio::test]
async fn renegotiates_nickname_on_collision() {
    let (client, mut events, mut server) = connect(|_| {}).await;
    next_event(&mut events).await;
    server.expect_greeting("bob").await;

    server.send(":srv 433 * bob :Nickname is already in use").await;
    assert_eq!(
        next_event(&mut events).await,
        Event::NickCollision {
            old: "bob".to_string(),
            new: "bob2".to_string(),
        }
    );
    assert_eq!(server.recv().await, "NICK bob2");

    server.send(":srv 433 * bob2 :Nickname is already in use").await;
    assert_eq!(
        next_event(&mut events).await,
        Event::NickCollision {
            old: "bob2".to_string(),
            new: "bob2_".to_string(),
        }
    );
    assert_eq!(server.recv().await, "NICK bob2_");

    client.stop().await;
}

#[tokio::test]
async fn routes_messages_and_user_lists() {
    let (client, mut events, mut server) = connect(|_| {}).await;
    next_event(&mut events).await;
    server.expect_greeting("bob").await;

    server.send(":alice!a@h PRIVMSG #chan :hello").await;
    assert!(matches!(next_event(&mut events).await, Event::Message { .. }));
    assert_eq!(
        next_event(&mut events).await,
        Event::Public {
            nickname: "alice".to_string(),
            text: "hello".to_string(),
        }
    );

    server.send(":alice!a@h PRIVMSG bob :psst").await;
    next_event(&mut events).await; // raw message
    assert!(matches!(next_event(&mut events).await, Event::Private { .. }));

    server.send(":alice!a@h PRIVMSG #chan :\u{1}ACTION waves\u{1}").await;
    next_event(&mut events).await; // raw message
    assert_eq!(
        next_event(&mut events).await,
        Event::Action {
            nickname: "alice".to_string(),
            text: "waves".to_string(),
        }
    );

    server.send(":srv 353 bob = #chan :alice @bob +carol").await;
    server.send(":srv 353 bob = #chan :dave").await;
    server.send(":srv 366 bob #chan :End of /NAMES list.").await;
    let Event::UserList { channel, mut users } = next_event(&mut events).await else {
        panic!("expected user list");
    };
    assert_eq!(channel, "#chan");
    users.sort();
    assert_eq!(users, vec!["+carol", "@bob", "alice", "dave"]);

    server.send(":srv 401 bob somebody :No such nick/channel").await;
    assert_eq!(
        next_event(&mut events).await,
        Event::ProtocolError {
            code: 401,
            targets: vec!["somebody".to_string()],
            reason: "No such nick/channel".to_string(),
        }
    );

    client.stop().await;
}

#[tokio::test]
async fn outbound_commands_reach_the_wire() {
    let (client, mut events, mut server) = connect(|_| {}).await;
    next_event(&mut events).await;
    server.expect_greeting("bob").await;

    client.join("#chan", None).expect("join");
    assert_eq!(server.recv().await, "JOIN #chan");

    client.join("#vault", Some("sekrit")).expect("join with key");
    assert_eq!(server.recv().await, "JOIN #vault sekrit");

    client.privmsg("#chan", "hi").expect("privmsg");
    assert_eq!(server.recv().await, "PRIVMSG #chan hi");

    client.part("#chan", Some("bye")).expect("part");
    assert_eq!(server.recv().await, "PART #chan bye");

    client.quit(Some("done")).await;
    assert_eq!(server.recv().await, "QUIT done");
}

#[tokio::test]
async fn flood_protection_paces_the_queue() {
    let (client, mut events, mut server) = connect(|config| {
        config.flood_protection = true;
        config.flood_protection_send_rate = 0.3;
    })
    .await;
    next_event(&mut events).await;
    server.expect_greeting("bob").await;

    for text in ["one", "two", "three"] {
        client.privmsg("#chan", text).expect("privmsg");
    }

    // Strict FIFO, paced by the virtual clock rather than burst out.
    assert_eq!(server.recv().await, "PRIVMSG #chan one");
    assert_eq!(server.recv().await, "PRIVMSG #chan two");
    assert_eq!(server.recv().await, "PRIVMSG #chan three");

    client.stop().await;
}

#[tokio::test]
async fn stop_ends_the_stream_after_disconnected() {
    let (client, mut events, mut server) = connect(|_| {}).await;
    next_event(&mut events).await;
    server.expect_greeting("bob").await;

    client.stop().await;

    // Everything still in flight drains to the terminal event, then the
    // stream ends; stop() has already returned by the time we read.
    let mut saw_disconnected = false;
    while let Some(event) = events.recv().await {
        if matches!(event, Event::Disconnected { .. }) {
            assert!(!saw_disconnected, "duplicate disconnection event");
            saw_disconnected = true;
        }
    }
    assert!(saw_disconnected);

    // Idempotent: a second stop is a no-op.
    client.stop().await;
}

#[tokio::test]
async fn server_closing_the_socket_is_terminal() {
    let (_client, mut events, mut server) = connect(|_| {}).await;
    next_event(&mut events).await;
    server.expect_greeting("bob").await;

    drop(server);

    let mut saw_disconnected = false;
    while let Some(event) = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("stream should end")
    {
        if matches!(event, Event::Disconnected { .. }) {
            saw_disconnected = true;
        }
    }
    assert!(saw_disconnected);
}

#[tokio::test]
async fn heartbeat_ticks_count_up() {
    let (client, mut events, mut server) = connect(|_| {}).await;
    server.expect_greeting("bob").await;

    let mut ticks = Vec::new();
    while ticks.len() < 2 {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event timed out")
            .expect("stream ended early");
        if let Event::Tick { uptime } = event {
            ticks.push(uptime);
        }
    }
    assert_eq!(ticks, vec![1, 2]);

    client.stop().await;
}
