//! persistent `git cat-file --batch` channel.
//!
//! One child process serves many lookups: we write an id followed by a
//! newline, git answers with a `"<id> <type> <size>"` header and exactly
//! `size` payload bytes (plus one trailing newline). The channel is
//! strictly half-duplex - one request in flight at a time - which is why
//! `fetch` takes `&mut self`. Sharing across threads happens a level up,
//! behind the repository's mutex.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::{debug, warn};

use crate::config::RepoConfig;
use crate::error::{StoreError, StoreResult};
use crate::object::{self, Object, ObjectKind};
use crate::types::ObjectId;

/// anything that can produce decoded objects by id.
///
/// The navigator and the history walk run against this trait, so tests
/// can feed them from an in-memory map instead of a live child process.
pub trait ObjectSource {
    fn fetch(&mut self, id: &ObjectId) -> StoreResult<Object>;
}

/// a lazily started `cat-file --batch` child and its pipes
pub struct BatchClient {
    config: RepoConfig,
    channel: Option<Channel>,
}

struct Channel {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl BatchClient {
    /// create a client; the child process is not spawned until first use
    pub fn new(config: RepoConfig) -> Self {
        Self {
            config,
            channel: None,
        }
    }

    /// start the batch channel. Idempotent: a second call is a no-op.
    pub fn open(&mut self) -> StoreResult<()> {
        if self.channel.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.config.git_binary)
            .arg("--git-dir")
            .arg(&self.config.git_dir)
            .arg("cat-file")
            .arg("--batch")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                StoreError::Process(format!(
                    "failed to spawn {}: {}",
                    self.config.git_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| StoreError::Process("child stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| StoreError::Process("child stdout not captured".to_string()))?;

        debug!(git_dir = %self.config.git_dir.display(), "cat-file channel opened");
        self.channel = Some(Channel {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });
        Ok(())
    }

    /// fetch one object by id: send the request, read the header, read
    /// exactly `size` payload bytes, dispatch to the matching decoder.
    pub fn fetch(&mut self, id: &ObjectId) -> StoreResult<Object> {
        self.open()?;
        let channel = match self.channel.as_mut() {
            Some(c) => c,
            None => return Err(StoreError::Process("channel not open".to_string())),
        };

        writeln!(channel.stdin, "{}", id)
            .and_then(|_| channel.stdin.flush())
            .map_err(|e| StoreError::Process(format!("request for {} failed: {}", id, e)))?;

        // header line; any blank lines before it are skipped
        let header = loop {
            let mut line = String::new();
            let n = channel
                .stdout
                .read_line(&mut line)
                .map_err(|e| StoreError::Process(format!("header read failed: {}", e)))?;
            if n == 0 {
                return Err(StoreError::Process(
                    "cat-file terminated before answering".to_string(),
                ));
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                break trimmed.to_string();
            }
        };

        let fields: Vec<&str> = header.split(' ').collect();
        if fields.len() == 2 && fields[1] == "missing" {
            return Err(StoreError::ObjectNotFound(fields[0].to_string()));
        }
        let [oid_field, kind_field, size_field] = fields.as_slice() else {
            return Err(StoreError::Protocol(format!(
                "malformed response header: {:?}",
                header
            )));
        };

        if *oid_field != id.as_str() {
            return Err(StoreError::Protocol(format!(
                "stream misaligned: asked for {}, header names {}",
                id, oid_field
            )));
        }
        let kind = ObjectKind::parse(kind_field).ok_or_else(|| {
            StoreError::Protocol(format!("unknown object type in header: {:?}", header))
        })?;
        let size: usize = size_field.parse().map_err(|_| {
            StoreError::Protocol(format!("unparsable size in header: {:?}", header))
        })?;

        // short reads over a pipe are normal; read_exact loops until the
        // full payload is collected
        let mut payload = vec![0u8; size];
        channel.stdout.read_exact(&mut payload).map_err(|e| {
            StoreError::Process(format!("payload read for {} failed: {}", id, e))
        })?;

        // git appends one newline after the payload; consume it so the
        // next header starts clean
        let mut newline = [0u8; 1];
        channel.stdout.read_exact(&mut newline).map_err(|e| {
            StoreError::Process(format!("trailing newline read for {} failed: {}", id, e))
        })?;
        if newline[0] != b'\n' {
            warn!(id = %id, byte = newline[0], "unexpected byte after payload");
        }

        debug!(id = %id.short(), kind = %kind, size, "fetched object");

        let oid = id.clone();
        match kind {
            ObjectKind::Blob => Ok(Object::Blob(object::decode_blob(oid, payload))),
            ObjectKind::Tree => object::decode_tree(oid, &payload).map(Object::Tree),
            ObjectKind::Commit => object::decode_commit(oid, &payload).map(Object::Commit),
        }
    }

    /// release the channel: close both pipes and reap the child.
    /// Safe to call multiple times.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            let Channel {
                mut child,
                stdin,
                stdout,
            } = channel;
            drop(stdin);
            drop(stdout);
            match child.wait() {
                Ok(status) => debug!(%status, "cat-file channel closed"),
                Err(e) => warn!("failed to reap cat-file child: {}", e),
            }
        }
    }
}

impl Drop for BatchClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl ObjectSource for BatchClient {
    fn fetch(&mut self, id: &ObjectId) -> StoreResult<Object> {
        BatchClient::fetch(self, id)
    }
}
