#![deny(unsafe_code)]
//! Cross-crate conformance suite for the CTH engine. The crate itself is
//! empty; everything lives in `tests/`.
