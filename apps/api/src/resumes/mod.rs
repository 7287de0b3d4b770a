// Resume workflow: upload → parse → session batch → save → export.
// Each handler runs one user action to completion under `AppState::action_gate`.

pub mod export;
pub mod handlers;
pub mod page;
pub mod save;
pub mod upload;
pub mod view;
