//! File content as a chain of fixed-size sealed chunks
//!
//! ```text
//! head (index 0)          chunk 1            tail (index n)
//! [data|next|tail,n] ---> [data|next] ---> ... [data|None]
//! ```
//!
//! Each chunk is sealed under keys derived from the file's root keys and its
//! index. The head is always written last, so it is the commit point for
//! store and append.

use sealshare_core::{RecordId, SealshareError, SealshareResult};
use sealshare_crypto::{chunk_keys, RecordKeys};
use sealshare_storage::Datastore;

use crate::records::{get_sealed, put_sealed, ChainHead, Chunk, FileEntry, FilePointer};
use crate::session::User;

fn write_chunk(
    store: &dyn Datastore,
    root: &RecordKeys,
    id: RecordId,
    index: u64,
    chunk: &Chunk,
) -> SealshareResult<()> {
    put_sealed(store, id, &chunk_keys(root, index)?, chunk)
}

fn read_chunk(
    store: &dyn Datastore,
    root: &RecordKeys,
    id: RecordId,
    index: u64,
) -> SealshareResult<Chunk> {
    get_sealed(store, id, &chunk_keys(root, index)?, "chunk")?
        .ok_or_else(|| SealshareError::NotFound(format!("chunk {index} is missing")))
}

fn chain_head(chunk: &Chunk) -> SealshareResult<ChainHead> {
    chunk
        .head
        .ok_or_else(|| SealshareError::Protocol("head chunk carries no chain metadata".into()))
}

/// Write `content` as a complete chain whose head lives at `pointer.head`.
/// Returns the number of chunks written.
pub(crate) fn write_chain(
    store: &dyn Datastore,
    pointer: &FilePointer,
    content: &[u8],
    block_size: usize,
) -> SealshareResult<usize> {
    let pieces: Vec<&[u8]> = if content.is_empty() {
        vec![content]
    } else {
        content.chunks(block_size).collect()
    };

    let mut ids = Vec::with_capacity(pieces.len());
    ids.push(pointer.head);
    ids.extend((1..pieces.len()).map(|_| RecordId::random()));

    for index in (1..pieces.len()).rev() {
        let chunk = Chunk {
            data: pieces[index].to_vec(),
            next: ids.get(index + 1).copied(),
            head: None,
        };
        write_chunk(store, &pointer.root, ids[index], index as u64, &chunk)?;
    }

    let last = pieces.len() - 1;
    let head = Chunk {
        data: pieces[0].to_vec(),
        next: ids.get(1).copied(),
        head: Some(ChainHead {
            tail: ids[last],
            last_index: last as u64,
        }),
    };
    write_chunk(store, &pointer.root, pointer.head, 0, &head)?;
    Ok(pieces.len())
}

/// Read and structurally validate a whole chain, head first.
pub(crate) fn read_chain(
    store: &dyn Datastore,
    pointer: &FilePointer,
    block_size: usize,
) -> SealshareResult<Vec<(RecordId, Chunk)>> {
    let head = read_chunk(store, &pointer.root, pointer.head, 0)?;
    let meta = chain_head(&head)?;
    let mut chain = vec![(pointer.head, head)];

    loop {
        let index = chain.len() as u64 - 1;
        let (_, chunk) = &chain[chain.len() - 1];
        if chunk.data.len() > block_size {
            return Err(SealshareError::Protocol(format!(
                "chunk {index} exceeds the block size"
            )));
        }
        let Some(next) = chunk.next else {
            break;
        };
        if chunk.data.len() != block_size {
            return Err(SealshareError::Protocol(format!(
                "non-tail chunk {index} is not full"
            )));
        }
        if index + 1 > meta.last_index {
            return Err(SealshareError::Protocol(
                "chain is longer than its head declares".into(),
            ));
        }

        let successor = read_chunk(store, &pointer.root, next, index + 1)?;
        if successor.head.is_some() {
            return Err(SealshareError::Protocol(format!(
                "chunk {} carries head metadata",
                index + 1
            )));
        }
        chain.push((next, successor));
    }

    let tail_index = chain.len() as u64 - 1;
    let tail_id = chain[chain.len() - 1].0;
    if tail_index != meta.last_index || tail_id != meta.tail {
        return Err(SealshareError::Protocol(
            "chain does not end at its declared tail".into(),
        ));
    }
    Ok(chain)
}

impl User {
    /// Create `filename` or overwrite its content.
    ///
    /// Overwriting keeps the file's root keys and head id, so every party the
    /// file is shared with sees the new content. A revoked share under this
    /// name is replaced by a new file owned by this user.
    pub fn store_file(&self, filename: &str, content: &[u8]) -> SealshareResult<()> {
        let existing = match self.load_entry(filename)? {
            None => None,
            Some(entry) => match self.resolve_entry(&entry) {
                Ok(pointer) => Some(pointer),
                Err(SealshareError::Permission(_)) => {
                    tracing::info!(
                        user = %self.username(),
                        file = %filename,
                        "share under this name was revoked; creating a new file"
                    );
                    None
                }
                Err(e) => return Err(e),
            },
        };

        let (pointer, created) = match existing {
            Some(pointer) => (pointer, false),
            None => (
                FilePointer {
                    root: RecordKeys::generate(),
                    head: RecordId::random(),
                },
                true,
            ),
        };

        let stale = if created {
            Vec::new()
        } else {
            self.stale_chunks(&pointer)
        };

        let chunks = write_chain(self.store(), &pointer, content, self.block_size)?;
        if created {
            self.save_entry(filename, &FileEntry::Owned(pointer))?;
        }
        for id in stale {
            self.store().delete(id)?;
        }

        tracing::debug!(
            user = %self.username(),
            file = %filename,
            chunks,
            created,
            "stored file"
        );
        Ok(())
    }

    /// Ids of the current chain's non-head chunks, which an overwrite orphans.
    fn stale_chunks(&self, pointer: &FilePointer) -> Vec<RecordId> {
        match read_chain(self.store(), pointer, self.block_size) {
            Ok(chain) => chain.into_iter().skip(1).map(|(id, _)| id).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "previous content unreadable; leaving its chunks in place");
                Vec::new()
            }
        }
    }

    /// Append to an existing file. Cost is proportional to `content`, not
    /// to the file's size.
    pub fn append_to_file(&self, filename: &str, content: &[u8]) -> SealshareResult<()> {
        let pointer = self.resolve(filename)?;
        if content.is_empty() {
            return Ok(());
        }

        let store = self.store();
        let root = &pointer.root;
        let block_size = self.block_size;

        let mut head = read_chunk(store, root, pointer.head, 0)?;
        let meta = chain_head(&head)?;

        let mut tail = if meta.last_index == 0 {
            if meta.tail != pointer.head || head.next.is_some() {
                return Err(SealshareError::Protocol(
                    "single-chunk file does not end at its head".into(),
                ));
            }
            None
        } else {
            let chunk = read_chunk(store, root, meta.tail, meta.last_index)?;
            if chunk.head.is_some() || chunk.next.is_some() {
                return Err(SealshareError::Protocol(
                    "declared tail is not a tail chunk".into(),
                ));
            }
            Some(chunk)
        };

        let tail_len = tail.as_ref().map_or(head.data.len(), |t| t.data.len());
        if tail_len > block_size {
            return Err(SealshareError::Protocol(
                "tail chunk exceeds the block size".into(),
            ));
        }
        let (fill, rest) = content.split_at((block_size - tail_len).min(content.len()));

        let pieces: Vec<&[u8]> = rest.chunks(block_size).collect();
        let ids: Vec<RecordId> = pieces.iter().map(|_| RecordId::random()).collect();
        for (i, piece) in pieces.iter().enumerate().rev() {
            let chunk = Chunk {
                data: piece.to_vec(),
                next: ids.get(i + 1).copied(),
                head: None,
            };
            write_chunk(store, root, ids[i], meta.last_index + 1 + i as u64, &chunk)?;
        }

        let first_new = ids.first().copied();
        let new_meta = match ids.last() {
            Some(&last) => ChainHead {
                tail: last,
                last_index: meta.last_index + ids.len() as u64,
            },
            None => meta,
        };

        match tail.as_mut() {
            Some(old_tail) => {
                old_tail.data.extend_from_slice(fill);
                old_tail.next = first_new;
                write_chunk(store, root, meta.tail, meta.last_index, old_tail)?;
                if first_new.is_some() {
                    head.head = Some(new_meta);
                    write_chunk(store, root, pointer.head, 0, &head)?;
                }
            }
            None => {
                head.data.extend_from_slice(fill);
                head.next = first_new;
                head.head = Some(new_meta);
                write_chunk(store, root, pointer.head, 0, &head)?;
            }
        }

        tracing::debug!(
            user = %self.username(),
            file = %filename,
            bytes = content.len(),
            new_chunks = ids.len(),
            "appended to file"
        );
        Ok(())
    }

    /// Full content of `filename`. Any missing or tampered chunk fails the
    /// whole read.
    pub fn load_file(&self, filename: &str) -> SealshareResult<Vec<u8>> {
        let pointer = self.resolve(filename)?;
        let chain = read_chain(self.store(), &pointer, self.block_size)?;

        let mut content = Vec::with_capacity(chain.len() * self.block_size);
        for (_, chunk) in &chain {
            content.extend_from_slice(&chunk.data);
        }
        Ok(content)
    }
}
