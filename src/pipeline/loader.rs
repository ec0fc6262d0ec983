//! Loading actor side of the pipeline.

use std::sync::Arc;

use flume::Sender;

use super::{PendingBuild, PublishedRouting, Shared};
use crate::errors::{Result, ShadingError};
use crate::pack::PackDefinitions;
use crate::taxonomy::ShadingTaxonomy;

/// A reserved reload sequence number.
///
/// Reserving marks every older, still unfinished reload as superseded.
#[must_use = "a reserved reload must be submitted"]
#[derive(Debug)]
pub struct ReloadTicket {
    sequence: u64,
}

impl ReloadTicket {
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Submits pack snapshots for resolution. Cheap to clone, usable from any
/// thread.
#[derive(Clone)]
pub struct PackLoader {
    shared: Arc<Shared>,
    sender: Sender<PendingBuild>,
}

impl PackLoader {
    pub(crate) fn new(shared: Arc<Shared>, sender: Sender<PendingBuild>) -> Self {
        Self { shared, sender }
    }

    /// Starts a reload, superseding every older one.
    pub fn reserve(&self) -> ReloadTicket {
        ReloadTicket {
            sequence: self.shared.next_sequence(),
        }
    }

    /// Reserves a sequence number and submits `pack` under it.
    pub fn submit_pack(&self, pack: PackDefinitions) -> Result<u64> {
        let ticket = self.reserve();
        self.submit(ticket, pack)
    }

    /// Resolves `pack` and hands it to the render actor.
    ///
    /// Fails with [`ShadingError::MissingRoot`] if the pack lacks the root
    /// program, and with [`ShadingError::Superseded`] if a newer reload was
    /// reserved meanwhile. In both cases the published routing is untouched.
    pub fn submit(&self, ticket: ReloadTicket, pack: PackDefinitions) -> Result<u64> {
        let sequence = ticket.sequence;
        self.ensure_latest(sequence)?;

        log::info!("Resolving pack '{}' (reload #{sequence})", pack.name());
        let unknown = pack.unknown_programs(&self.shared.taxonomy);
        if !unknown.is_empty() {
            log::warn!(
                "Pack '{}' supplies programs no stage routes to: {}",
                pack.name(),
                unknown.join(", ")
            );
        }

        let table = self.shared.resolver().resolve_pack(&pack).inspect_err(|e| {
            log::error!("Rejecting reload #{sequence}: {e}");
        })?;

        // Resolution may have raced with a newer reload.
        self.ensure_latest(sequence)?;

        self.sender
            .send(PendingBuild {
                sequence,
                pack,
                table,
            })
            .map_err(|_| ShadingError::RendererDisconnected)?;
        Ok(sequence)
    }

    fn ensure_latest(&self, sequence: u64) -> Result<()> {
        let latest = self
            .shared
            .latest_sequence()
            .max(self.shared.published_sequence());
        if latest > sequence {
            log::debug!("Discarding reload #{sequence}, superseded by #{latest}");
            return Err(ShadingError::Superseded { sequence, latest });
        }
        Ok(())
    }

    /// The routing currently published to the render actor.
    #[must_use]
    pub fn current(&self) -> Arc<PublishedRouting> {
        self.shared.current()
    }

    /// Highest reload sequence number reserved so far.
    #[must_use]
    pub fn latest_sequence(&self) -> u64 {
        self.shared.latest_sequence()
    }

    #[must_use]
    pub fn published_sequence(&self) -> u64 {
        self.shared.published_sequence()
    }

    #[must_use]
    pub fn taxonomy(&self) -> &ShadingTaxonomy {
        &self.shared.taxonomy
    }
}
