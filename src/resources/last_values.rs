use crate::http_client::{Payload, ResponseFormat};
use crate::resource::{Resource, ResourceKind};
use crate::types::Measurement;
use anyhow::Result;

/// Latest measurement snapshot, `/lastvalues`
pub struct LastValues;

impl LastValues {
    pub const ENDPOINT: &'static str = "/lastvalues";

    pub fn resource() -> Resource<Self> {
        Resource::new(LastValues, Vec::new())
    }
}

impl ResourceKind for LastValues {
    type State = Vec<Measurement>;

    const NAME: &'static str = "last values";
    const FORMAT: ResponseFormat = ResponseFormat::Text;

    fn endpoint(&self, _state: &Self::State) -> String {
        Self::ENDPOINT.to_string()
    }

    fn apply(&self, payload: Payload, state: &mut Self::State) -> Result<bool> {
        let values = parse_last_values(&payload.into_text()?);
        if *state == values {
            return Ok(false);
        }
        *state = values;
        Ok(true)
    }
}

/// Parse `name:value,name:value` into measurements, in input order.
///
/// Power channels (names starting with `CT`) get a `W` suffix. Empty segments
/// are skipped; a segment without `:` has an empty value.
pub fn parse_last_values(text: &str) -> Vec<Measurement> {
    text.split(',')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once(':').unwrap_or((pair, ""));
            let units = if key.starts_with("CT") { "W" } else { "" };
            Measurement::new(key, format!("{value}{units}"))
        })
        .collect()
}
