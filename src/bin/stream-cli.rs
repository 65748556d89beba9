use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use virtual_stream::peer::message::encode_binary_response;
use virtual_stream::peer::DataMessage;

#[derive(Parser)]
#[command(name = "stream-cli")]
#[command(about = "Management CLI and reference peer for the virtual stream server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status and pending exchanges
    Status,
    /// List connected peers
    Peers,
    /// Serve a local file as a controlling peer
    Peer {
        /// File whose bytes are streamed
        #[arg(short, long)]
        file: PathBuf,

        /// Resource id announced in the stream URL (defaults to the file name)
        #[arg(long)]
        id: Option<String>,

        #[arg(long, default_value = "/peer")]
        peer_path: String,

        #[arg(long, default_value = "virtual-stream")]
        marker: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => admin_get(&cli.url, &cli.key, "/admin/status").await?,
        Commands::Peers => admin_get(&cli.url, &cli.key, "/admin/peers").await?,
        Commands::Peer {
            file,
            id,
            peer_path,
            marker,
        } => {
            let resource_id = match id {
                Some(id) => id,
                None => file_name(&file)?,
            };
            run_peer(&cli.url, &peer_path, &marker, &file, &resource_id).await?;
        }
    }

    Ok(())
}

async fn admin_get(url: &str, key: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);

    let res = reqwest::Client::new()
        .get(format!("{}{}", url, path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn file_name(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("cannot derive a resource id from {}", path.display()).into())
}

async fn run_peer(
    url: &str,
    peer_path: &str,
    marker: &str,
    path: &Path,
    resource_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::open(path).await?;
    let size = file.metadata().await?.len();

    let ws_url = format!("{}{}?type=window", url.replacen("http", "ws", 1), peer_path);
    let (socket, _) = connect_async(ws_url.as_str()).await?;
    let (mut sink, mut stream) = socket.split();

    println!("Connected to {}", ws_url);
    println!("Stream URL: {}/{}/{}/{}", url, marker, resource_id, size);

    while let Some(frame) = stream.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let (request_id, start, end, file_id) = match serde_json::from_str(text.as_str()) {
            Ok(DataMessage::RequestData {
                request_id,
                start,
                end,
                file_id,
            }) => (request_id, start, end, file_id),
            Ok(_) | Err(_) => {
                eprintln!("Ignoring unexpected message: {}", text.as_str());
                continue;
            }
        };

        let chunk = if file_id == resource_id {
            read_range(&mut file, start, end).await
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unknown resource '{}'", file_id),
            ))
        };

        let reply = match chunk {
            Ok(chunk) => Message::Binary(encode_binary_response(&request_id, &chunk)?.into()),
            Err(e) => {
                eprintln!("Request {} ({}-{}) failed: {}", request_id, start, end, e);
                let error = DataMessage::DataError { request_id };
                Message::Text(serde_json::to_string(&error)?.into())
            }
        };
        sink.send(reply).await?;
    }

    println!("Server closed the connection");
    Ok(())
}

async fn read_range(file: &mut File, start: u64, end: u64) -> std::io::Result<Vec<u8>> {
    if end < start {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "end before start"));
    }
    file.seek(SeekFrom::Start(start)).await?;

    let mut chunk = Vec::with_capacity((end - start + 1) as usize);
    file.take(end - start + 1).read_to_end(&mut chunk).await?;
    Ok(chunk)
}
