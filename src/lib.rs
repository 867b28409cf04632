//! # Chalkboard
//!
//! Content administration backend for a literacy-education platform. The
//! crate owns the edit flow for image content items: validating uploads,
//! normalizing them to the platform's size rules, curating their literacy/
//! numeracy label associations, and persisting everything to SQLite.
//!
//! # Architecture: Validate → Normalize → Persist
//!
//! A submit moves through three independent layers:
//!
//! ```text
//! 1. Validate   form + payload  →  FieldErrors | accepted payload
//! 2. Normalize  accepted bytes  →  downscaled, re-encoded bytes
//! 3. Persist    entity          →  single read-modify-write row update
//! ```
//!
//! Validation failures are data, never aborts: the caller gets the field
//! errors plus a repopulated form to redisplay. Only hard failures — a
//! missing entity, a storage error — propagate as `Err`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Content entities and closed reference-data enums |
//! | [`imaging`] | Pure image ops: probe dimensions, proportional downscale, re-encode |
//! | [`validate`] | Field-scoped validation pipeline for uploads |
//! | [`labels`] | Idempotent add/remove of image↔entity label references |
//! | [`store`] | SQLite content store: reads, title index, transactional updates |
//! | [`edit`] | Orchestration: edit form, submit finalization, label requests |
//! | [`config`] | `chalkboard.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## Extension-Based Format Detection
//!
//! The upload's filename extension decides its format (`.png`, `.jpg`,
//! `.jpeg`, `.gif`, case-insensitive) — deliberately no magic-byte
//! sniffing. The declared format is then authoritative at decode time, so a
//! mislabeled payload still fails cleanly with a `decodeFailed` field error
//! rather than being silently accepted as something else.
//!
//! ## Width Gate, Not Resolution Police
//!
//! PNG/JPG uploads must be at least `min_width` pixels wide; wider uploads
//! are downscaled to exactly that width (Lanczos3, aspect preserved) so
//! stored payloads stay bounded. An upload already at the minimum width is
//! stored byte-identical — no pointless re-encode. GIFs (typically small
//! animations) bypass the gate entirely and are stored verbatim, which is
//! also why the `image` crate's GIF decoder is not even compiled in.
//!
//! ## Snapshot Label Reconciliation
//!
//! Label add/remove never mutates a shared list in place. [`labels`]
//! exposes value-returning operations on an immutable snapshot that return
//! `None` for no-ops, so persistence happens exactly when something
//! changed and repeated calls converge. Membership is by entity id alone.
//!
//! ## Explicit Contributor Context
//!
//! Every orchestration call takes an authenticated
//! [`types::Contributor`] parameter. There is no session object and no
//! process-wide current-user state; locale-scoped option lists come from
//! the context the caller passes in.

pub mod config;
pub mod edit;
pub mod imaging;
pub mod labels;
pub mod store;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
