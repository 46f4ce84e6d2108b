use std::io;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use duel::{Packet, PacketReader, write_packet};

/// A TCP link to the relay split into a reader and a writer task, so the
/// game loop only ever touches channels.
pub struct ServerConnection {
    outbound: mpsc::UnboundedSender<Packet>,
    inbound: mpsc::UnboundedReceiver<Packet>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ServerConnection {
    pub async fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        log::info!("connected to {}", stream.peer_addr()?);

        let (read_half, mut write_half) = stream.into_split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Packet>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        let writer = tokio::spawn(async move {
            while let Some(packet) = outbound_rx.recv().await {
                if let Err(e) = write_packet(&mut write_half, &packet).await {
                    log::warn!("send failed: {}", e);
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            let mut reader = PacketReader::new(read_half);
            loop {
                match reader.next_packet().await {
                    Ok(Some(packet)) => {
                        if inbound_tx.send(packet).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        log::info!("server closed the connection");
                        break;
                    }
                    Err(e) => {
                        log::warn!("receive failed: {}", e);
                        break;
                    }
                }
            }
            if reader.dropped() > 0 {
                log::debug!("dropped {} malformed packets", reader.dropped());
            }
        });

        Ok(Self {
            outbound,
            inbound,
            reader,
            writer,
        })
    }

    /// Fire-and-forget; a closed link is noticed on the receive side.
    pub fn send(&self, packet: Packet) {
        if self.outbound.send(packet).is_err() {
            log::debug!("dropping packet for a closed connection");
        }
    }

    pub fn send_all(&self, packets: impl IntoIterator<Item = Packet>) {
        for packet in packets {
            self.send(packet);
        }
    }

    /// `None` once the server has gone away.
    pub async fn recv(&mut self) -> Option<Packet> {
        self.inbound.recv().await
    }
}

impl Drop for ServerConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}
