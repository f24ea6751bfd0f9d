use serde::Deserialize;

/// `GET /alive?year=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliveQuery {
    pub year: Option<i32>,
}
