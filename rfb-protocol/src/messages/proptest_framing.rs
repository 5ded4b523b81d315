//! Property tests for message framing.
//!
//! These tests verify that wire-type parsing is robust against fragmentation
//! at arbitrary byte boundaries: a partial structure must leave the queue
//! untouched, and the full structure must parse once the rest arrives.
