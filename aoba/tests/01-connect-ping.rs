// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use tokio::net::TcpStream;

mod common;
use common::{raw_connect, read_frame, send_bytes, send_packet, Broker};
use codec::v3::ConnectPacket;

#[tokio::test]
async fn test_connect_and_ping() {
    let broker = Broker::start().await;

    let mut stream = TcpStream::connect(broker.addr).await.unwrap();
    let packet = ConnectPacket::new("c1").unwrap();
    send_packet(&mut stream, &packet).await;

    let frame = read_frame(&mut stream).await.unwrap();
    assert_eq!(frame, vec![0x20, 0x02, 0x00, 0x00]);

    send_bytes(&mut stream, &[0xc0, 0x00]).await;
    let frame = read_frame(&mut stream).await.unwrap();
    assert_eq!(frame, vec![0xd0, 0x00]);

    broker.shutdown();
}

#[tokio::test]
async fn test_connect_client_id_boundaries() {
    let broker = Broker::start().await;

    // Lengths 1 and 23 are accepted.
    for client_id in ["x", &"x".repeat(23)] {
        let mut stream = TcpStream::connect(broker.addr).await.unwrap();
        send_bytes(&mut stream, &raw_connect(client_id, 3, 60)).await;
        let frame = read_frame(&mut stream).await.unwrap();
        assert_eq!(frame, vec![0x20, 0x02, 0x00, 0x00]);
    }

    // Lengths 0 and 24 are rejected with identifier-rejected.
    for client_id in ["", &"x".repeat(24)] {
        let mut stream = TcpStream::connect(broker.addr).await.unwrap();
        send_bytes(&mut stream, &raw_connect(client_id, 3, 60)).await;
        let frame = read_frame(&mut stream).await.unwrap();
        assert_eq!(frame, vec![0x20, 0x02, 0x00, 0x02]);

        // The broker closes the connection after a reject.
        assert!(read_frame(&mut stream).await.is_none());
    }

    broker.shutdown();
}

#[tokio::test]
async fn test_connect_unacceptable_protocol_version() {
    let broker = Broker::start().await;

    let mut stream = TcpStream::connect(broker.addr).await.unwrap();
    send_bytes(&mut stream, &raw_connect("c1", 4, 60)).await;
    let frame = read_frame(&mut stream).await.unwrap();
    assert_eq!(frame, vec![0x20, 0x02, 0x00, 0x01]);

    broker.shutdown();
}

#[tokio::test]
async fn test_first_packet_must_be_connect() {
    let broker = Broker::start().await;

    let mut stream = TcpStream::connect(broker.addr).await.unwrap();
    send_bytes(&mut stream, &[0xc0, 0x00]).await;

    // Closed silently, no connect ack.
    assert!(read_frame(&mut stream).await.is_none());

    broker.shutdown();
}
