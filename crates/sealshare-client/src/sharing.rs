//! Invitations and revocation
//!
//! Recipients never see the owner's file pointer. The owner mints one
//! indirection record per direct recipient (a copy of the pointer sealed
//! under its own keys) and hands out a `ShareLink` to it. Recipients who
//! re-share forward the link they hold, so everyone below a direct recipient
//! hangs off that recipient's indirection and loses access with it.
//!
//! Invitation blob: `seal_to(recipient, json(ShareLink)) || ed25519(sender, ciphertext)`

use sealshare_core::{RecordId, SealshareError, SealshareResult};
use sealshare_crypto::pke::seal_to;
use sealshare_crypto::{RecordKeys, SIGNATURE_SIZE};

use crate::files::{read_chain, write_chain};
use crate::records::{decode, encode, get_sealed, put_sealed, FileEntry, FilePointer, ShareLink};
use crate::session::User;

impl User {
    /// Grant `recipient` access to `filename` and return the invitation
    /// token to pass them out of band.
    pub fn create_invitation(&self, filename: &str, recipient: &str) -> SealshareResult<RecordId> {
        if recipient.is_empty() {
            return Err(SealshareError::Input("recipient must not be empty".into()));
        }
        let recipient_key = self.lookup_encryption_key(recipient)?;

        let entry = self
            .load_entry(filename)?
            .ok_or_else(|| SealshareError::NotFound(format!("no such file: {filename}")))?;
        let pointer = self.resolve_entry(&entry)?;
        let link = match entry {
            FileEntry::Shared(link) => link,
            FileEntry::Owned(_) => self.link_for_recipient(filename, recipient, &pointer)?,
        };

        let ciphertext = seal_to(&recipient_key, &encode(&link)?)?;
        let signature = self.record.signing_key.sign(&ciphertext);
        let mut blob = ciphertext;
        blob.extend_from_slice(&signature);

        let token = RecordId::random();
        self.store().put(token, blob)?;

        tracing::info!(
            user = %self.username(),
            file = %filename,
            recipient = %recipient,
            "created invitation"
        );
        Ok(token)
    }

    /// Owner side: the recipient's indirection, minted on first invite.
    fn link_for_recipient(
        &self,
        filename: &str,
        recipient: &str,
        pointer: &FilePointer,
    ) -> SealshareResult<ShareLink> {
        let mut tree = self.load_sharing_tree(filename)?.unwrap_or_default();
        if let Some(link) = tree.link_for(recipient) {
            put_sealed(self.store(), link.id, &link.keys, pointer)?;
            return Ok(link);
        }

        let link = ShareLink {
            id: RecordId::random(),
            keys: RecordKeys::generate(),
        };
        put_sealed(self.store(), link.id, &link.keys, pointer)?;
        tree.insert(recipient, &link);
        self.save_sharing_tree(filename, &tree)?;
        Ok(link)
    }

    /// Accept an invitation from `sender`, making the file available under
    /// `filename`. The invitation is consumed on success.
    pub fn accept_invitation(
        &self,
        sender: &str,
        token: RecordId,
        filename: &str,
    ) -> SealshareResult<()> {
        if sender.is_empty() {
            return Err(SealshareError::Input("sender must not be empty".into()));
        }

        let blob = self
            .store()
            .get(token)?
            .ok_or_else(|| SealshareError::NotFound("invitation not found".into()))?;
        let sender_key = self.lookup_verification_key(sender)?;

        if blob.len() < SIGNATURE_SIZE {
            return Err(SealshareError::Integrity("invitation is truncated".into()));
        }
        let (ciphertext, signature) = blob.split_at(blob.len() - SIGNATURE_SIZE);
        sender_key.verify(ciphertext, signature)?;
        let payload = self.record.encryption_key.open(ciphertext)?;
        let link: ShareLink = decode(&payload, "share link")?;

        if self.store().get(self.entry_id(filename))?.is_some() {
            return Err(SealshareError::Conflict(format!(
                "file already exists: {filename}"
            )));
        }
        let live: Option<FilePointer> =
            get_sealed(self.store(), link.id, &link.keys, "indirection record")?;
        if live.is_none() {
            return Err(SealshareError::NotFound(
                "invitation has been revoked".into(),
            ));
        }

        self.save_entry(filename, &FileEntry::Shared(link))?;
        self.store().delete(token)?;

        tracing::info!(
            user = %self.username(),
            file = %filename,
            sender = %sender,
            "accepted invitation"
        );
        Ok(())
    }

    /// Revoke `recipient` (and everyone they re-shared with) from a file this
    /// user owns.
    ///
    /// The content is re-encrypted under fresh root keys at a fresh head id.
    /// The new chain is complete before anything points at it, and the old
    /// chunks are deleted last.
    pub fn revoke_access(&self, filename: &str, recipient: &str) -> SealshareResult<()> {
        let entry = self
            .load_entry(filename)?
            .ok_or_else(|| SealshareError::NotFound(format!("no such file: {filename}")))?;
        let pointer = match entry {
            FileEntry::Owned(pointer) => pointer,
            FileEntry::Shared(_) => {
                return Err(SealshareError::Permission(
                    "only the owner can revoke access".into(),
                ))
            }
        };

        let mut tree = self.load_sharing_tree(filename)?.ok_or_else(|| {
            SealshareError::NotFound(format!("{filename} has not been shared"))
        })?;
        let revoked = tree.remove(recipient).ok_or_else(|| {
            SealshareError::NotFound(format!("{recipient} has no access to {filename}"))
        })?;

        let old_chain = read_chain(self.store(), &pointer, self.block_size)?;
        let content: Vec<u8> = old_chain
            .iter()
            .flat_map(|(_, chunk)| chunk.data.iter().copied())
            .collect();

        self.store().delete(revoked)?;

        let fresh = FilePointer {
            root: RecordKeys::generate(),
            head: RecordId::random(),
        };
        write_chain(self.store(), &fresh, &content, self.block_size)?;
        self.save_entry(filename, &FileEntry::Owned(fresh.clone()))?;
        for (id, keys) in &tree.links {
            put_sealed(self.store(), *id, keys, &fresh)?;
        }
        self.save_sharing_tree(filename, &tree)?;

        for (id, _) in old_chain {
            self.store().delete(id)?;
        }

        tracing::info!(
            user = %self.username(),
            file = %filename,
            recipient = %recipient,
            remaining = tree.recipients.len(),
            "revoked access"
        );
        Ok(())
    }
}
