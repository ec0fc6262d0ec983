//! Program Registry
//!
//! Owns every compiled GPU program, keyed by effective program name.
//!
//! # Lifecycle
//!
//! | Phase | Method | Effect |
//! |-------|--------|--------|
//! | Stage | [`ProgramRegistry::ensure_compiled`] | Compiles (or reuses) a program; not yet visible to draw calls |
//! | Commit | [`ProgramRegistry::commit`] | Replaces the active name → handle binding, retiring handles it drops |
//! | Recycle | [`ProgramRegistry::begin_frame`] | Releases retired handles older than `frames_in_flight` frames |
//!
//! Compiled programs are deduplicated by `(name, content hash)`, so
//! resubmitting an unchanged pack costs no compilation, while a changed
//! source compiles next to the old program until the swap.

mod backend;

pub use backend::{CompileDiagnostics, GpuBackend};

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{SlotMap, new_key_type};

use crate::pack::ShaderSource;
use crate::utils::interner::{self, Symbol};

new_key_type! {
    /// Handle of a compiled program owned by a [`ProgramRegistry`].
    pub struct ProgramHandle;
}

struct CompiledProgram<P> {
    name: Symbol,
    source_hash: u64,
    program: P,
}

pub struct ProgramRegistry<B: GpuBackend> {
    backend: B,
    programs: SlotMap<ProgramHandle, CompiledProgram<B::Program>>,
    by_source: FxHashMap<(Symbol, u64), ProgramHandle>,
    /// Binding consulted by draw calls.
    active: FxHashMap<Symbol, ProgramHandle>,
    /// Handles dropped from the binding, with the frame they were retired in.
    retired: Vec<(u64, ProgramHandle)>,
    frame: u64,
    frames_in_flight: u64,
}

impl<B: GpuBackend> ProgramRegistry<B> {
    #[must_use]
    pub fn new(backend: B, frames_in_flight: u32) -> Self {
        Self {
            backend,
            programs: SlotMap::with_key(),
            by_source: FxHashMap::default(),
            active: FxHashMap::default(),
            retired: Vec::new(),
            frame: 0,
            frames_in_flight: u64::from(frames_in_flight),
        }
    }

    /// Compiles `source` as program `name`, or returns the existing handle
    /// for the same name and source.
    pub fn ensure_compiled(
        &mut self,
        name: Symbol,
        source: &ShaderSource,
    ) -> Result<ProgramHandle, CompileDiagnostics> {
        let source_hash = source.content_hash();
        if let Some(&handle) = self.by_source.get(&(name, source_hash)) {
            return Ok(handle);
        }

        let label = interner::resolve(name);
        match self.backend.compile(label, source) {
            Ok(program) => {
                let handle = self.programs.insert(CompiledProgram {
                    name,
                    source_hash,
                    program,
                });
                self.by_source.insert((name, source_hash), handle);
                log::debug!("Compiled program '{label}' ({source_hash:016x})");
                Ok(handle)
            }
            Err(compiler_log) => {
                log::warn!("Program '{label}' failed to compile:\n{compiler_log}");
                Err(CompileDiagnostics {
                    program: label.to_string(),
                    log: compiler_log,
                })
            }
        }
    }

    /// Makes `binding` the active name → handle map.
    ///
    /// Handles the previous binding used and the new one does not are
    /// retired, not released: draw calls of the current frame may still
    /// reference them. Compiled programs referenced by neither binding are
    /// released immediately.
    pub fn commit(&mut self, binding: FxHashMap<Symbol, ProgramHandle>) {
        let kept: FxHashSet<ProgramHandle> = binding.values().copied().collect();

        self.retired.retain(|(_, handle)| !kept.contains(handle));
        for (_, old) in std::mem::replace(&mut self.active, binding) {
            if !kept.contains(&old) {
                self.retired.push((self.frame, old));
            }
        }

        self.discard_unreferenced();
    }

    /// Releases compiled programs that are neither active nor retired,
    /// e.g. the staged programs of a rejected build.
    pub fn discard_unreferenced(&mut self) {
        let mut referenced: FxHashSet<ProgramHandle> = self.active.values().copied().collect();
        referenced.extend(self.retired.iter().map(|&(_, h)| h));

        let orphans: Vec<ProgramHandle> = self
            .programs
            .keys()
            .filter(|h| !referenced.contains(h))
            .collect();
        for handle in orphans {
            self.release(handle);
        }
    }

    /// Advances the frame counter and releases retired programs no frame
    /// in flight can still use.
    pub fn begin_frame(&mut self) -> u64 {
        self.frame += 1;

        let frame = self.frame;
        let horizon = self.frames_in_flight;
        let (expired, pending): (Vec<_>, Vec<_>) = self
            .retired
            .drain(..)
            .partition(|&(retired_at, _)| frame >= retired_at + horizon);
        self.retired = pending;

        for (_, handle) in expired {
            self.release(handle);
        }
        frame
    }

    fn release(&mut self, handle: ProgramHandle) {
        if let Some(compiled) = self.programs.remove(handle) {
            self.by_source.remove(&(compiled.name, compiled.source_hash));
            log::debug!("Released program '{}'", interner::resolve(compiled.name));
            self.backend.release(compiled.program);
        }
    }

    /// Active handle bound to `name`.
    #[inline]
    #[must_use]
    pub fn handle(&self, name: Symbol) -> Option<ProgramHandle> {
        self.active.get(&name).copied()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, handle: ProgramHandle) -> Option<&B::Program> {
        self.programs.get(handle).map(|c| &c.program)
    }

    /// Active program bound to `name`.
    #[must_use]
    pub fn program(&self, name: Symbol) -> Option<&B::Program> {
        self.handle(name).and_then(|h| self.get(h))
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self, name: Symbol) -> bool {
        self.active.contains_key(&name)
    }

    #[inline]
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Compiled programs currently alive, active or not.
    #[inline]
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.programs.len()
    }

    #[inline]
    #[must_use]
    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: GpuBackend> Drop for ProgramRegistry<B> {
    fn drop(&mut self) {
        for (_, compiled) in self.programs.drain() {
            self.backend.release(compiled.program);
        }
    }
}
