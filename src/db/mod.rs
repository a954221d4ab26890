use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};

use crate::models::{Identity, LoginCode, Profile, Sponsor};
use crate::services::error::ServiceError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, ServiceError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            ServiceError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), ServiceError> {
        tracing::info!("Creating MongoDB indexes for identity-service");

        // Every collection is keyed by a single natural identifier, so each
        // gets one unique index.
        let identity_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_id_lookup".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.identities()
            .create_index(identity_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_id index on identities collection: {}", e);
                ServiceError::from(e)
            })?;
        tracing::info!("Created unique index on identities.user_id");

        // Multikey index backing the who-holds-this-role reverse lookup.
        let roles_index = IndexModel::builder()
            .keys(doc! { "roles": 1 })
            .options(IndexOptions::builder().name("roles_lookup".to_string()).build())
            .build();

        self.identities()
            .create_index(roles_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create roles index on identities collection: {}", e);
                ServiceError::from(e)
            })?;
        tracing::info!("Created multikey index on identities.roles");

        let profile_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_id_lookup".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.profiles()
            .create_index(profile_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_id index on profiles collection: {}", e);
                ServiceError::from(e)
            })?;
        tracing::info!("Created unique index on profiles.user_id");

        let sponsor_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_lookup".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.sponsors()
            .create_index(sponsor_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index on sponsors collection: {}", e);
                ServiceError::from(e)
            })?;
        tracing::info!("Created unique index on sponsors.email");

        let code_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_lookup".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.login_codes()
            .create_index(code_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index on login_codes collection: {}", e);
                ServiceError::from(e)
            })?;
        tracing::info!("Created unique index on login_codes.email");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                ServiceError::from(e)
            })?;
        Ok(())
    }

    pub fn identities(&self) -> Collection<Identity> {
        self.db.collection("identities")
    }

    pub fn profiles(&self) -> Collection<Profile> {
        self.db.collection("profiles")
    }

    pub fn sponsors(&self) -> Collection<Sponsor> {
        self.db.collection("sponsors")
    }

    pub fn login_codes(&self) -> Collection<LoginCode> {
        self.db.collection("login_codes")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
