//! Command handlers for the CLI

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mesh_api::{run_server, AppState, MeshApiClient};
use mesh_core::{KeyRegistry, MeshConfig, PeerId, PeerKeypair, Record};
use mesh_pipeline::{encode_chunk, CheckpointStore, UploadCheckpoint};
use mesh_store::{chunk_key, CredentialIssuer, LocalObjectStore};

type CmdResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Generate and print a peer key pair
pub fn handle_keygen(id: &str) -> CmdResult {
    let keypair = PeerKeypair::generate(PeerId::new(id));

    println!("Peer key pair generated.");
    println!("  Peer ID:    {}", keypair.peer_id());
    println!("  Public key: {}", keypair.public_key_hex());
    println!("  Secret key: {}", keypair.secret_key_hex());
    println!();
    println!("Register the public key on the store node with:");
    println!("  mesh serve --register {}={}", id, keypair.public_key_hex());
    Ok(())
}

/// Run a store node
pub async fn handle_serve(
    host: &str,
    port: u16,
    data_dir: PathBuf,
    register: &[String],
) -> CmdResult {
    let mut registry = KeyRegistry::new();
    for pair in register {
        let (id, key_hex) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected id=public_key_hex, got '{}'", pair))?;
        registry.register_hex(PeerId::new(id), key_hex)?;
        println!("Registered peer: {}", id);
    }

    let config = MeshConfig::from_env();
    let store = Arc::new(LocalObjectStore::new(data_dir));
    let issuer = Arc::new(CredentialIssuer::new(
        Arc::new(registry),
        store.clone(),
        &config,
    ));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("Starting store node on {}...", addr);
    run_server(AppState::new(issuer, store), addr).await?;
    Ok(())
}

/// Probe node health
pub async fn handle_status(api_url: &str) -> CmdResult {
    let client = MeshApiClient::new(api_url);
    if client.health().await? {
        println!("Node at {} is healthy.", api_url);
    } else {
        println!("Node at {} reported unhealthy.", api_url);
    }
    Ok(())
}

/// Upload a record file as one job, resuming from any local checkpoint
pub async fn handle_upload(
    api_url: &str,
    id: &str,
    secret_key: &str,
    job_id: &str,
    file: &Path,
    chunk_size: usize,
    checkpoint_dir: PathBuf,
) -> CmdResult {
    let keypair = PeerKeypair::from_hex(PeerId::new(id), secret_key)?;
    let client = MeshApiClient::new(api_url);
    let checkpoints = CheckpointStore::new(checkpoint_dir);

    let records = read_record_file(file)?;
    println!("Loaded {} records from {}", records.len(), file.display());

    let mut checkpoint = match checkpoints.load(job_id).await? {
        Some(checkpoint) => {
            println!(
                "Resuming job {} from chunk {}",
                job_id,
                checkpoint.next_chunk_index()
            );
            checkpoint
        }
        None => UploadCheckpoint::new(job_id),
    };

    let mut credential = client.request_write_credential(&keypair).await?;
    let mut sent = 0u32;
    let mut skipped = 0u32;

    for (index, batch) in records.chunks(chunk_size).enumerate() {
        let index = index as u32;
        if checkpoint.covers(index) {
            skipped += 1;
            continue;
        }
        if credential.is_expired() {
            credential = client.request_write_credential(&keypair).await?;
        }

        let bytes = encode_chunk(batch)?;
        client
            .put_object(&credential, &chunk_key(job_id, index), bytes)
            .await?;

        checkpoint.advance(index, batch.len() as u64);
        checkpoints.save(&checkpoint).await?;
        sent += 1;
    }

    println!(
        "Upload complete: {} chunks sent, {} skipped, {} records committed.",
        sent, skipped, checkpoint.total_records_processed
    );
    Ok(())
}

/// List committed chunks under an identity prefix
pub async fn handle_objects(api_url: &str, identity: &str) -> CmdResult {
    let client = MeshApiClient::new(api_url);
    let objects = client.list_objects(identity).await?;

    if objects.is_empty() {
        println!("No committed objects under {}.", identity);
        return Ok(());
    }

    println!("Objects under {}:", identity);
    let mut total = 0u64;
    for entry in &objects {
        println!("  {:<40} {:>10} B  {}", entry.key, entry.size, entry.modified_at);
        total += entry.size;
    }
    println!("{} objects, {} bytes total.", objects.len(), total);
    Ok(())
}

/// Summarize a record file
pub fn handle_records(file: &Path, recent: usize) -> CmdResult {
    let records = read_record_file(file)?;

    let mut by_source: HashMap<&'static str, usize> = HashMap::new();
    for record in &records {
        *by_source.entry(record.source.as_str()).or_insert(0) += 1;
    }

    println!("{} records in {}", records.len(), file.display());
    let mut sources: Vec<_> = by_source.into_iter().collect();
    sources.sort();
    for (source, count) in sources {
        println!("  {:<12} {}", source, count);
    }

    if recent > 0 {
        let mut sorted = records;
        sorted.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        println!("Most recent captures:");
        for record in sorted.iter().take(recent) {
            println!("  {}  {}", record.captured_at, record.uri);
        }
    }
    Ok(())
}

/// Show local upload checkpoints
pub async fn handle_checkpoints(dir: PathBuf) -> CmdResult {
    let store = CheckpointStore::new(&dir);
    let jobs = store.list_jobs().await?;

    if jobs.is_empty() {
        println!("No checkpoints in {}.", dir.display());
        return Ok(());
    }

    for job_id in jobs {
        if let Some(checkpoint) = store.load(&job_id).await? {
            println!(
                "{}: chunk {:?}, {} records, last progress {}",
                checkpoint.job_id,
                checkpoint.last_committed_chunk_index,
                checkpoint.total_records_processed,
                checkpoint.last_processed_time
            );
        }
    }
    Ok(())
}

fn read_record_file(file: &Path) -> Result<Vec<Record>, Box<dyn std::error::Error + Send + Sync>> {
    let content = std::fs::read_to_string(file)?;
    let mut records = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(line)?);
    }
    Ok(records)
}
