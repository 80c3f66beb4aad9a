// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;

use aoba::auth::Authenticator;
use aoba::config::Config;
use aoba::server::Server;
use codec::v3::{ConnectAckPacket, ConnectPacket, ConnectReturnCode, SubscribeAckPacket, SubscribePacket};
use codec::{
    ByteArray, DecodePacket, EncodePacket, FixedHeader, PacketId, PacketType, QoS, StringData,
    U16Data,
};

/// An in-process broker bound to an ephemeral port.
pub struct Broker {
    pub addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
}

impl Broker {
    pub async fn start() -> Self {
        Self::start_with_auth(None, false).await
    }

    pub async fn start_with_auth(auth: Option<Box<dyn Authenticator>>, enable_auth: bool) -> Self {
        let mut config = Config::default();
        config.mut_listener().set_port(0);
        config.mut_security().set_enable_auth(enable_auth);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut server = Server::bind(config, auth, shutdown_rx)
            .await
            .expect("Failed to bind broker");
        let addr = server.local_addr().expect("Failed to get local addr");
        tokio::spawn(async move { server.run_loop().await });

        Self { addr, shutdown_tx }
    }

    pub fn shutdown(&self) {
        let _ret = self.shutdown_tx.send(true);
    }
}

pub async fn send_packet<P: EncodePacket>(stream: &mut TcpStream, packet: &P) {
    let mut buf = Vec::new();
    packet.encode(&mut buf).expect("Failed to encode packet");
    stream.write_all(&buf).await.expect("Failed to write packet");
}

pub async fn send_bytes(stream: &mut TcpStream, bytes: &[u8]) {
    stream.write_all(bytes).await.expect("Failed to write bytes");
}

/// Read one complete frame. `None` when the peer closes the connection
/// or nothing arrives within five seconds.
pub async fn read_frame(stream: &mut TcpStream) -> Option<Vec<u8>> {
    timeout(Duration::from_secs(5), read_frame_inner(stream))
        .await
        .ok()
        .flatten()
}

async fn read_frame_inner(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut header = [0_u8; 1];
    stream.read_exact(&mut header).await.ok()?;
    let mut frame = vec![header[0]];

    let mut remaining: usize = 0;
    let mut multiplier: usize = 1;
    loop {
        let mut byte = [0_u8; 1];
        stream.read_exact(&mut byte).await.ok()?;
        frame.push(byte[0]);
        remaining += usize::from(byte[0] & 0x7f) * multiplier;
        multiplier *= 128;
        if byte[0] & 0x80 == 0 {
            break;
        }
    }

    let mut payload = vec![0_u8; remaining];
    stream.read_exact(&mut payload).await.ok()?;
    frame.extend_from_slice(&payload);
    Some(frame)
}

/// Connect with default options and expect an accepted handshake.
pub async fn connect(addr: SocketAddr, client_id: &str) -> TcpStream {
    let packet = ConnectPacket::new(client_id).expect("Invalid client id");
    connect_packet(addr, &packet).await
}

/// Connect with a prepared packet and expect an accepted handshake.
pub async fn connect_packet(addr: SocketAddr, packet: &ConnectPacket) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.expect("Failed to connect");
    send_packet(&mut stream, packet).await;

    let frame = read_frame(&mut stream).await.expect("No connect ack");
    let mut ba = ByteArray::new(&frame);
    let ack = ConnectAckPacket::decode(&mut ba).expect("Invalid connect ack");
    assert_eq!(ack.return_code(), ConnectReturnCode::Accepted);
    stream
}

/// Subscribe and consume the subscribe ack.
pub async fn subscribe(stream: &mut TcpStream, filter: &str, qos: QoS, packet_id: u16) {
    let packet =
        SubscribePacket::new(filter, qos, PacketId::new(packet_id)).expect("Invalid filter");
    send_packet(stream, &packet).await;

    let frame = read_frame(stream).await.expect("No subscribe ack");
    let mut ba = ByteArray::new(&frame);
    let ack = SubscribeAckPacket::decode(&mut ba).expect("Invalid subscribe ack");
    assert_eq!(ack.packet_id(), PacketId::new(packet_id));
}

/// Build connect packet bytes by hand, for values the packet builder
/// refuses to produce.
pub fn raw_connect(client_id: &str, protocol_level: u8, keep_alive: u16) -> Vec<u8> {
    let mut payload = Vec::new();
    let name = StringData::from("MQIsdp").unwrap();
    name.encode(&mut payload).unwrap();
    payload.push(protocol_level);
    // Clean session only.
    payload.push(0b0000_0010);
    U16Data::new(keep_alive).encode(&mut payload).unwrap();
    let id = StringData::from(client_id).unwrap();
    id.encode(&mut payload).unwrap();

    let mut buf = Vec::new();
    let header = FixedHeader::new(PacketType::Connect, payload.len()).unwrap();
    header.encode(&mut buf).unwrap();
    buf.extend_from_slice(&payload);
    buf
}
