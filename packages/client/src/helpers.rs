//! Higher-level queries built on a [`Request`] session.

use tracing::{info, warn};
use vamdc::query::{species_data_query, transitions_query, vamdc_species_data_query};
use vamdc::{strip_database_prefix, SpeciesRef, SPECIES_QUERY};

use crate::document::{DocumentParser, QueryResult};
use crate::error::RequestError;
use crate::request::{Request, RequestOptions};

type Outcome<P> = Result<Option<QueryResult<<P as DocumentParser>::Document>>, RequestError>;

impl<P: DocumentParser> Request<P> {
    /// All species of the node (`SELECT SPECIES`).
    pub fn get_species(&mut self) -> Outcome<P> {
        self.set_query(SPECIES_QUERY);
        self.execute(RequestOptions::default())
    }
}

/// Radiative transitions of one species.
///
/// `species` is an integer id or a composite `"<db>-<id>"` string; the
/// database prefix is removed before the query is built.
pub fn get_transitions<P: DocumentParser>(
    request: &mut Request<P>,
    species: impl Into<SpeciesRef>,
) -> Outcome<P> {
    let id = species.into().numeric_id()?;
    request.set_query(transitions_query(id));
    request.execute(RequestOptions::default())
}

/// Everything the node holds for one species.
///
/// Tries the node-local `species_id` first (database prefix removed). If
/// that yields nothing and `vamdc_species_id` is given, queries by
/// `VAMDCSpeciesID` instead; not every node can restrict on the node-local
/// id.
///
/// A failure of the first attempt is logged and treated as "no result"
/// unless the session was built with `strict_species_lookup`. A failure of
/// the second attempt is always returned.
pub fn get_species_data<P: DocumentParser>(
    request: &mut Request<P>,
    species_id: Option<&str>,
    vamdc_species_id: Option<&str>,
) -> Outcome<P> {
    let mut result = None;

    if let Some(species_id) = species_id {
        info!("species data: processing {species_id}");
        request.set_query(species_data_query(strip_database_prefix(species_id)));
        match request.execute(RequestOptions::default()) {
            Ok(r) => result = r,
            Err(e) if !request.strict_species_lookup => {
                warn!("species data: query by SpeciesID failed: {e}; trying VAMDCSpeciesID");
            }
            Err(e) => return Err(e),
        }
    }

    if result.is_none() {
        if let Some(vamdc_species_id) = vamdc_species_id {
            info!("species data: processing {vamdc_species_id}");
            request.set_query(vamdc_species_data_query(vamdc_species_id));
            result = request.execute(RequestOptions::default())?;
        }
    }

    Ok(result)
}
