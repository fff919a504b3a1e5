//! End-to-end tests for the log analytics workspace live under `tests/`.
