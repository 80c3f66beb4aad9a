// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::env;
use tokio::net::TcpStream;

mod common;
use aoba::auth::FileAuth;
use common::{connect, connect_packet, read_frame, send_packet, subscribe, Broker};
use codec::v3::{ConnectPacket, PublishPacket};
use codec::{ByteArray, DecodePacket, QoS};

#[tokio::test]
async fn test_will_on_grace_expiry() {
    let broker = Broker::start().await;

    let mut s2 = connect(broker.addr, "watcher").await;
    subscribe(&mut s2, "w", QoS::AtMostOnce, 1).await;

    // Declare a will with a one second keep alive, then fall silent.
    let mut packet = ConnectPacket::new("mortal").unwrap();
    packet.set_keep_alive(1);
    packet
        .set_will("w", b"bye", QoS::AtMostOnce, false)
        .unwrap();
    let mut s1 = connect_packet(broker.addr, &packet).await;

    // After 1.5 x keep alive the will arrives at the subscriber.
    let frame = read_frame(&mut s2).await.expect("No will publish");
    let mut ba = ByteArray::new(&frame);
    let received = PublishPacket::decode(&mut ba).unwrap();
    assert_eq!(received.topic(), "w");
    assert_eq!(received.message(), b"bye");

    // And the silent client's socket is closed.
    assert!(read_frame(&mut s1).await.is_none());

    broker.shutdown();
}

#[tokio::test]
async fn test_disconnect_does_not_publish_will() {
    let broker = Broker::start().await;

    let mut s2 = connect(broker.addr, "watcher2").await;
    subscribe(&mut s2, "w2", QoS::AtMostOnce, 1).await;

    let mut packet = ConnectPacket::new("polite").unwrap();
    packet
        .set_will("w2", b"bye", QoS::AtMostOnce, false)
        .unwrap();
    let mut s1 = connect_packet(broker.addr, &packet).await;

    // A clean disconnect packet, then close.
    common::send_bytes(&mut s1, &[0xe0, 0x00]).await;
    drop(s1);

    // No will shows up within the read window.
    assert!(read_frame(&mut s2).await.is_none());

    broker.shutdown();
}

#[tokio::test]
async fn test_auth_gate() {
    let path = env::temp_dir().join(format!("aoba-e2e-passwd-{}", std::process::id()));
    let file_auth = FileAuth::new(path.clone());
    file_auth.regenerate(&[("admin", "admin")]).unwrap();

    let broker = Broker::start_with_auth(Some(Box::new(file_auth)), true).await;

    // Valid credentials are accepted.
    let mut packet = ConnectPacket::new("a1").unwrap();
    packet.set_username("admin").unwrap();
    packet.set_password(b"admin").unwrap();
    let _stream = connect_packet(broker.addr, &packet).await;

    // A wrong password earns return code 4.
    let mut packet = ConnectPacket::new("a2").unwrap();
    packet.set_username("admin").unwrap();
    packet.set_password(b"nope").unwrap();
    let mut stream = TcpStream::connect(broker.addr).await.unwrap();
    send_packet(&mut stream, &packet).await;
    let frame = read_frame(&mut stream).await.unwrap();
    assert_eq!(frame, vec![0x20, 0x02, 0x00, 0x04]);

    // Missing credentials earn return code 5.
    let packet = ConnectPacket::new("a3").unwrap();
    let mut stream = TcpStream::connect(broker.addr).await.unwrap();
    send_packet(&mut stream, &packet).await;
    let frame = read_frame(&mut stream).await.unwrap();
    assert_eq!(frame, vec![0x20, 0x02, 0x00, 0x05]);

    broker.shutdown();
    let _ret = std::fs::remove_file(path);
}
