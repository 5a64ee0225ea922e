//! MongoDB Interface
//!
//! Connection management and the MongoDB-backed AMC store. Each CBSD is
//! one document in the `cbsds` collection holding the `DetailedCbsd`
//! (radio row, states and grants); pending SAS requests live in the
//! `requests` collection. Transactions need a replica set deployment.

use mongodb::{
    bson::{self, doc, Bson, Document},
    options::ClientOptions,
    sync::{Client, ClientSession, Collection, Database},
};
use std::collections::HashSet;
use thiserror::Error;

use crate::field_mask::FieldMask;
use crate::manager::{AmcManager, Transactional};
use crate::types::{
    DbCbsd, DbGrant, DbRequest, DetailedCbsd, DP_CBSDS_COLLECTION, DP_REQUESTS_COLLECTION,
};

/// Database interface error types
#[derive(Error, Debug)]
pub enum DbiError {
    #[error("MongoDB error: {0}")]
    MongoDb(#[from] mongodb::error::Error),
    #[error("BSON error: {0}")]
    Bson(#[from] bson::de::Error),
    #[error("BSON serialization error: {0}")]
    BsonSer(#[from] bson::ser::Error),
    #[error("No database URI provided")]
    NoDbUri,
    #[error("CBSD not found: {0}")]
    CbsdNotFound(i64),
    #[error("Grant not found: {0}")]
    GrantNotFound(i64),
    #[error("Retry needed")]
    Retry,
}

/// Result type for database operations
pub type DbiResult<T> = Result<T, DbiError>;

const DEFAULT_DB_NAME: &str = "dp";

/// Mask credentials in database URI for logging
fn masked_db_uri(db_uri: &str) -> String {
    // Split on '@' to separate credentials from host
    if let Some(at_pos) = db_uri.rfind('@') {
        let host_part = &db_uri[at_pos + 1..];
        format!("mongodb://*****:*****@{host_part}")
    } else {
        db_uri.to_string()
    }
}

/// Build the `$set` document writing only the masked columns of `cbsd`
fn masked_set_document(cbsd: &DbCbsd, mask: &FieldMask) -> DbiResult<Document> {
    let row = bson::to_document(cbsd)?;
    let mut set = Document::new();
    for field in mask.iter() {
        let value = row.get(field.column()).cloned().unwrap_or(Bson::Null);
        set.insert(format!("cbsd.{}", field.column()), value);
    }
    Ok(set)
}

fn bson_to_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        _ => None,
    }
}

/// MongoDB-backed store
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
    masked_db_uri: String,
}

impl MongoStore {
    /// Connect and check the server with a `ping`
    ///
    /// # Returns
    /// * `Err(DbiError::NoDbUri)` if URI is empty
    /// * `Err(DbiError::Retry)` if the server did not answer
    pub fn connect(db_uri: &str) -> DbiResult<Self> {
        if db_uri.is_empty() {
            log::error!("No DB_URI");
            return Err(DbiError::NoDbUri);
        }

        let masked_db_uri = masked_db_uri(db_uri);
        let client_options = ClientOptions::parse(db_uri)?;
        let db_name = client_options
            .default_database
            .clone()
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());

        let client = Client::with_options(client_options)?;
        let database = client.database(&db_name);

        if let Err(e) = database.run_command(doc! { "ping": 1 }, None) {
            log::warn!("Failed to connect to server [{masked_db_uri}]: {e}");
            return Err(DbiError::Retry);
        }
        log::info!("MongoDB URI: '{masked_db_uri}'");

        Ok(MongoStore {
            client,
            database,
            masked_db_uri,
        })
    }

    pub fn masked_db_uri(&self) -> &str {
        &self.masked_db_uri
    }

    fn cbsds(&self) -> Collection<DetailedCbsd> {
        self.database.collection(DP_CBSDS_COLLECTION)
    }

    fn requests(&self) -> Collection<Document> {
        self.database.collection(DP_REQUESTS_COLLECTION)
    }
}

impl Transactional for MongoStore {
    fn in_transaction<T, F>(&mut self, f: F) -> DbiResult<T>
    where
        F: FnOnce(&mut dyn AmcManager) -> DbiResult<T>,
    {
        let mut session = self.client.start_session(None)?;
        session.start_transaction(None)?;

        let result = {
            let mut tx = MongoTransaction {
                cbsds: self.cbsds(),
                requests: self.requests(),
                session: &mut session,
            };
            f(&mut tx)
        };
        match result {
            Ok(value) => {
                session.commit_transaction()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction() {
                    log::warn!("Failed to abort transaction: {abort}");
                }
                Err(e)
            }
        }
    }
}

/// Manager bound to one open client session
struct MongoTransaction<'a> {
    cbsds: Collection<DetailedCbsd>,
    requests: Collection<Document>,
    session: &'a mut ClientSession,
}

impl AmcManager for MongoTransaction<'_> {
    fn get_state(&mut self) -> DbiResult<Vec<DetailedCbsd>> {
        let pending: HashSet<i64> = self
            .requests
            .distinct_with_session("cbsd_id", None, None, self.session)?
            .iter()
            .filter_map(bson_to_i64)
            .collect();

        let mut cursor = self.cbsds.find_with_session(None, None, self.session)?;
        let mut state = Vec::new();
        let mut total = 0usize;
        for cbsd in cursor.iter(self.session) {
            let cbsd = cbsd?;
            total += 1;
            if cbsd.is_feasible(pending.contains(&cbsd.cbsd.id)) {
                state.push(cbsd);
            }
        }
        log::debug!("Loaded {} feasible CBSDs out of {}", state.len(), total);
        Ok(state)
    }

    fn create_request(&mut self, request: &DbRequest) -> DbiResult<()> {
        let document = bson::to_document(request)?;
        self.requests
            .insert_one_with_session(document, None, self.session)?;
        Ok(())
    }

    fn delete_cbsd(&mut self, id: i64) -> DbiResult<()> {
        let result = self
            .cbsds
            .delete_one_with_session(doc! { "cbsd.id": id }, None, self.session)?;
        if result.deleted_count == 0 {
            return Err(DbiError::CbsdNotFound(id));
        }
        Ok(())
    }

    fn update_cbsd(&mut self, cbsd: &DbCbsd, mask: &FieldMask) -> DbiResult<()> {
        if mask.is_empty() {
            return Ok(());
        }
        let set = masked_set_document(cbsd, mask)?;
        let result = self.cbsds.update_one_with_session(
            doc! { "cbsd.id": cbsd.id },
            doc! { "$set": set },
            None,
            self.session,
        )?;
        if result.matched_count == 0 {
            return Err(DbiError::CbsdNotFound(cbsd.id));
        }
        Ok(())
    }

    fn delete_grant(&mut self, grant: &DbGrant) -> DbiResult<()> {
        let result = self.cbsds.update_one_with_session(
            doc! { "cbsd.id": grant.cbsd_id },
            doc! { "$pull": { "grants": { "grant.id": grant.id } } },
            None,
            self.session,
        )?;
        if result.matched_count == 0 {
            return Err(DbiError::CbsdNotFound(grant.cbsd_id));
        }
        if result.modified_count == 0 {
            return Err(DbiError::GrantNotFound(grant.id));
        }
        Ok(())
    }
}
