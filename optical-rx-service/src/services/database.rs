use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_document, Bson, DateTime as BsonDateTime, Document},
    options::{
        FindOneAndUpdateOptions, FindOptions, IndexOptions, ReplaceOptions, ReturnDocument,
        UpdateOptions,
    },
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::store::{AlertScope, RxStore};
use crate::models::{
    analytics::UNKNOWN_PLATFORM, Affiliate, AnalyticsEvent, Device, DeviceActivity, DeviceFilter,
    EventType, ExpiryAlert, FamilyMember, Prescription, RxType, UserEmail, UserSubscription,
};

const FAMILY_MEMBERS: &str = "family_members";
const PRESCRIPTIONS: &str = "prescriptions";
const SUBSCRIPTIONS: &str = "subscriptions";
const DEVICES: &str = "devices";
const ANALYTICS_EVENTS: &str = "analytics_events";
const AFFILIATES: &str = "affiliates";
const USER_EMAILS: &str = "user_emails";
const EXPIRY_ALERTS: &str = "expiry_alerts";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for optical-rx-service");

        self.create_index(FAMILY_MEMBERS, doc! { "id": 1 }, "id_idx", true)
            .await?;
        self.create_index(
            FAMILY_MEMBERS,
            doc! { "account_id": 1, "created_at": 1 },
            "account_created_idx",
            false,
        )
        .await?;

        self.create_index(PRESCRIPTIONS, doc! { "id": 1 }, "id_idx", true)
            .await?;
        self.create_index(
            PRESCRIPTIONS,
            doc! { "account_id": 1, "family_member_id": 1 },
            "account_member_idx",
            false,
        )
        .await?;

        self.create_index(SUBSCRIPTIONS, doc! { "account_id": 1 }, "account_idx", true)
            .await?;

        self.create_index(DEVICES, doc! { "device_id": 1 }, "device_id_idx", true)
            .await?;
        self.create_index(DEVICES, doc! { "last_active": -1 }, "last_active_idx", false)
            .await?;
        self.create_index(DEVICES, doc! { "first_seen": -1 }, "first_seen_idx", false)
            .await?;

        self.create_index(
            ANALYTICS_EVENTS,
            doc! { "event_type": 1, "timestamp": -1 },
            "type_timestamp_idx",
            false,
        )
        .await?;
        self.create_index(ANALYTICS_EVENTS, doc! { "date": 1 }, "date_idx", false)
            .await?;

        self.create_index(AFFILIATES, doc! { "id": 1 }, "id_idx", true)
            .await?;
        self.create_index(
            AFFILIATES,
            doc! { "order": 1, "created_at": 1 },
            "order_idx",
            false,
        )
        .await?;

        self.create_index(
            USER_EMAILS,
            doc! { "account_id": 1, "email": 1 },
            "account_email_idx",
            true,
        )
        .await?;

        self.create_index(EXPIRY_ALERTS, doc! { "id": 1 }, "id_idx", true)
            .await?;
        // One alert per prescription, email, offset and expiry date.
        self.create_index(
            EXPIRY_ALERTS,
            doc! { "prescription_id": 1, "email": 1, "days_before": 1, "expiry_date": 1 },
            "alert_schedule_idx",
            true,
        )
        .await?;
        self.create_index(
            EXPIRY_ALERTS,
            doc! { "account_id": 1, "sent": 1, "alert_date": 1 },
            "due_alerts_idx",
            false,
        )
        .await?;

        tracing::info!("Successfully created all MongoDB indexes for optical-rx-service");
        Ok(())
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        name: &str,
        unique: bool,
    ) -> Result<(), AppError> {
        let index = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(name.to_string())
                    .unique(unique)
                    .build(),
            )
            .build();

        self.db
            .collection::<Document>(collection)
            .create_index(index, None)
            .await
            .map_err(|e| {
                tracing::error!(collection = %collection, "Failed to create {} index: {}", name, e);
                AppError::from(e)
            })?;
        Ok(())
    }

    fn members(&self) -> Collection<FamilyMember> {
        self.db.collection(FAMILY_MEMBERS)
    }

    fn prescriptions(&self) -> Collection<Prescription> {
        self.db.collection(PRESCRIPTIONS)
    }

    fn subscriptions(&self) -> Collection<UserSubscription> {
        self.db.collection(SUBSCRIPTIONS)
    }

    fn devices(&self) -> Collection<Device> {
        self.db.collection(DEVICES)
    }

    fn events(&self) -> Collection<AnalyticsEvent> {
        self.db.collection(ANALYTICS_EVENTS)
    }

    fn affiliates(&self) -> Collection<Affiliate> {
        self.db.collection(AFFILIATES)
    }

    fn emails(&self) -> Collection<UserEmail> {
        self.db.collection(USER_EMAILS)
    }

    fn alerts(&self) -> Collection<ExpiryAlert> {
        self.db.collection(EXPIRY_ALERTS)
    }
}

fn sorted_by(sort: Document) -> FindOptions {
    FindOptions::builder().sort(sort).build()
}

fn device_filter_doc(filter: &DeviceFilter) -> Document {
    let mut query = Document::new();
    if let Some(since) = filter.active_since {
        query.insert("last_active", doc! { "$gte": BsonDateTime::from_chrono(since) });
    }
    let mut first_seen = Document::new();
    if let Some(from) = filter.first_seen_from {
        first_seen.insert("$gte", BsonDateTime::from_chrono(from));
    }
    if let Some(before) = filter.first_seen_before {
        first_seen.insert("$lt", BsonDateTime::from_chrono(before));
    }
    if !first_seen.is_empty() {
        query.insert("first_seen", first_seen);
    }
    if let Some(platform) = &filter.platform {
        query.insert("platform", platform.as_str());
    }
    query
}

#[async_trait]
impl RxStore for MongoStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn insert_member(&self, member: &FamilyMember) -> Result<(), AppError> {
        self.members().insert_one(member, None).await?;
        Ok(())
    }

    async fn list_members(&self, account_id: &str) -> Result<Vec<FamilyMember>, AppError> {
        let cursor = self
            .members()
            .find(
                doc! { "account_id": account_id },
                sorted_by(doc! { "created_at": 1 }),
            )
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_member(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<FamilyMember>, AppError> {
        Ok(self
            .members()
            .find_one(doc! { "account_id": account_id, "id": id }, None)
            .await?)
    }

    async fn replace_member(&self, member: &FamilyMember) -> Result<bool, AppError> {
        let result = self
            .members()
            .replace_one(
                doc! { "account_id": &member.account_id, "id": &member.id },
                member,
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_member(&self, account_id: &str, id: &str) -> Result<bool, AppError> {
        let result = self
            .members()
            .delete_one(doc! { "account_id": account_id, "id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn count_members(&self, account_id: &str) -> Result<u64, AppError> {
        Ok(self
            .members()
            .count_documents(doc! { "account_id": account_id }, None)
            .await?)
    }

    async fn insert_prescription(&self, rx: &Prescription) -> Result<(), AppError> {
        self.prescriptions().insert_one(rx, None).await?;
        Ok(())
    }

    async fn list_prescriptions(
        &self,
        account_id: &str,
        family_member_id: Option<&str>,
    ) -> Result<Vec<Prescription>, AppError> {
        let mut filter = doc! { "account_id": account_id };
        if let Some(member_id) = family_member_id {
            filter.insert("family_member_id", member_id);
        }
        let cursor = self
            .prescriptions()
            .find(filter, sorted_by(doc! { "created_at": 1 }))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_prescription(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<Prescription>, AppError> {
        Ok(self
            .prescriptions()
            .find_one(doc! { "account_id": account_id, "id": id }, None)
            .await?)
    }

    async fn replace_prescription(&self, rx: &Prescription) -> Result<bool, AppError> {
        let result = self
            .prescriptions()
            .replace_one(
                doc! { "account_id": &rx.account_id, "id": &rx.id },
                rx,
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_prescription(&self, account_id: &str, id: &str) -> Result<bool, AppError> {
        let result = self
            .prescriptions()
            .delete_one(doc! { "account_id": account_id, "id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_member_prescriptions(
        &self,
        account_id: &str,
        family_member_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let filter = doc! { "account_id": account_id, "family_member_id": family_member_id };

        // Only the ids are needed; skip the image payloads.
        let cursor = self
            .db
            .collection::<Document>(PRESCRIPTIONS)
            .find(
                filter.clone(),
                FindOptions::builder().projection(doc! { "id": 1 }).build(),
            )
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        let ids: Vec<String> = docs
            .iter()
            .filter_map(|d| d.get_str("id").ok().map(str::to_string))
            .collect();

        self.prescriptions().delete_many(filter, None).await?;
        Ok(ids)
    }

    async fn count_prescriptions(
        &self,
        account_id: &str,
        rx_type: Option<RxType>,
    ) -> Result<u64, AppError> {
        let mut filter = doc! { "account_id": account_id };
        if let Some(rx_type) = rx_type {
            filter.insert("rx_type", rx_type.to_string());
        }
        Ok(self.prescriptions().count_documents(filter, None).await?)
    }

    async fn find_subscription(
        &self,
        account_id: &str,
    ) -> Result<Option<UserSubscription>, AppError> {
        Ok(self
            .subscriptions()
            .find_one(doc! { "account_id": account_id }, None)
            .await?)
    }

    async fn save_subscription(&self, sub: &UserSubscription) -> Result<(), AppError> {
        self.subscriptions()
            .replace_one(
                doc! { "account_id": &sub.account_id },
                sub,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn record_device_activity(&self, activity: &DeviceActivity) -> Result<(), AppError> {
        let seen_at = BsonDateTime::from_chrono(activity.seen_at);
        let mut set = doc! { "last_active": seen_at };
        let mut set_on_insert = doc! { "first_seen": seen_at };

        match &activity.platform {
            Some(platform) => set.insert("platform", platform.as_str()),
            None => set_on_insert.insert("platform", UNKNOWN_PLATFORM),
        };
        match &activity.app_version {
            Some(version) => set.insert("app_version", version.as_str()),
            None => set_on_insert.insert("app_version", Bson::Null),
        };

        self.devices()
            .update_one(
                doc! { "device_id": &activity.device_id },
                doc! { "$set": set, "$setOnInsert": set_on_insert },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), AppError> {
        self.events().insert_one(event, None).await?;
        Ok(())
    }

    async fn count_devices(&self, filter: &DeviceFilter) -> Result<u64, AppError> {
        Ok(self
            .devices()
            .count_documents(device_filter_doc(filter), None)
            .await?)
    }

    async fn count_events(
        &self,
        event_type: EventType,
        since: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        Ok(self
            .events()
            .count_documents(
                doc! {
                    "event_type": event_type.as_str(),
                    "timestamp": { "$gte": BsonDateTime::from_chrono(since) },
                },
                None,
            )
            .await?)
    }

    async fn count_active_devices_on(&self, date: NaiveDate) -> Result<u64, AppError> {
        let devices = self
            .events()
            .distinct("device_id", doc! { "date": date.to_string() }, None)
            .await?;
        Ok(devices.len() as u64)
    }

    async fn list_affiliates(&self, active_only: bool) -> Result<Vec<Affiliate>, AppError> {
        let filter = if active_only {
            doc! { "is_active": true }
        } else {
            doc! {}
        };
        let cursor = self
            .affiliates()
            .find(filter, sorted_by(doc! { "order": 1, "created_at": 1 }))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_affiliates(&self) -> Result<u64, AppError> {
        Ok(self.affiliates().count_documents(doc! {}, None).await?)
    }

    async fn insert_affiliates(&self, partners: &[Affiliate]) -> Result<(), AppError> {
        if partners.is_empty() {
            return Ok(());
        }
        self.affiliates().insert_many(partners, None).await?;
        Ok(())
    }

    async fn seed_affiliates(&self, partners: &[Affiliate]) -> Result<u64, AppError> {
        let mut added = 0;
        for partner in partners {
            let fields = to_document(partner)
                .map_err(|e| AppError::StoreError(anyhow::Error::new(e)))?;
            // Upsert on the unique id, so concurrent seeders converge on one row.
            let result = self
                .affiliates()
                .update_one(
                    doc! { "id": &partner.id },
                    doc! { "$setOnInsert": fields },
                    UpdateOptions::builder().upsert(true).build(),
                )
                .await?;
            if result.upserted_id.is_some() {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn find_affiliate(&self, id: &str) -> Result<Option<Affiliate>, AppError> {
        Ok(self.affiliates().find_one(doc! { "id": id }, None).await?)
    }

    async fn replace_affiliate(&self, partner: &Affiliate) -> Result<bool, AppError> {
        let result = self
            .affiliates()
            .replace_one(doc! { "id": &partner.id }, partner, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_affiliate(&self, id: &str) -> Result<bool, AppError> {
        let result = self.affiliates().delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_emails(&self, account_id: &str) -> Result<Vec<UserEmail>, AppError> {
        let cursor = self
            .emails()
            .find(
                doc! { "account_id": account_id, "is_active": true },
                sorted_by(doc! { "created_at": 1 }),
            )
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_email(
        &self,
        account_id: &str,
        email: &str,
    ) -> Result<Option<UserEmail>, AppError> {
        Ok(self
            .emails()
            .find_one(doc! { "account_id": account_id, "email": email }, None)
            .await?)
    }

    async fn insert_email(&self, email: &UserEmail) -> Result<(), AppError> {
        self.emails().insert_one(email, None).await?;
        Ok(())
    }

    async fn delete_email(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<UserEmail>, AppError> {
        Ok(self
            .emails()
            .find_one_and_delete(doc! { "account_id": account_id, "id": id }, None)
            .await?)
    }

    async fn list_alerts(
        &self,
        account_id: &str,
        prescription_id: Option<&str>,
    ) -> Result<Vec<ExpiryAlert>, AppError> {
        let mut filter = doc! { "account_id": account_id };
        if let Some(prescription_id) = prescription_id {
            filter.insert("prescription_id", prescription_id);
        }
        let cursor = self
            .alerts()
            .find(filter, sorted_by(doc! { "alert_date": 1, "days_before": -1 }))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_alerts(&self, alerts: &[ExpiryAlert]) -> Result<(), AppError> {
        if alerts.is_empty() {
            return Ok(());
        }
        self.alerts().insert_many(alerts, None).await?;
        Ok(())
    }

    async fn list_due_alerts(
        &self,
        account_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<ExpiryAlert>, AppError> {
        let cursor = self
            .alerts()
            .find(
                doc! {
                    "account_id": account_id,
                    "sent": false,
                    "alert_date": { "$lte": today.to_string() },
                },
                sorted_by(doc! { "alert_date": 1 }),
            )
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn mark_alert_sent(
        &self,
        account_id: &str,
        id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<ExpiryAlert>, AppError> {
        Ok(self
            .alerts()
            .find_one_and_update(
                doc! { "account_id": account_id, "id": id },
                doc! { "$set": { "sent": true, "sent_at": BsonDateTime::from_chrono(sent_at) } },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?)
    }

    async fn delete_alerts(&self, account_id: &str, scope: AlertScope) -> Result<u64, AppError> {
        let filter = match scope {
            AlertScope::Prescriptions(ids) => {
                doc! { "account_id": account_id, "prescription_id": { "$in": ids } }
            }
            AlertScope::UnsentForPrescription(id) => {
                doc! { "account_id": account_id, "prescription_id": id, "sent": false }
            }
            AlertScope::UnsentForEmail(email) => {
                doc! { "account_id": account_id, "email": email, "sent": false }
            }
        };
        let result = self.alerts().delete_many(filter, None).await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn device_filter_translates_bounds() {
        let now = Utc::now();
        let filter = DeviceFilter {
            first_seen_from: Some(now - Duration::days(7)),
            first_seen_before: Some(now),
            platform: Some("ios".to_string()),
            ..Default::default()
        };
        let query = device_filter_doc(&filter);

        let first_seen = query.get_document("first_seen").unwrap();
        assert!(first_seen.contains_key("$gte"));
        assert!(first_seen.contains_key("$lt"));
        assert_eq!(query.get_str("platform").unwrap(), "ios");
        assert!(!query.contains_key("last_active"));
    }

    #[test]
    fn empty_device_filter_is_empty_query() {
        assert!(device_filter_doc(&DeviceFilter::default()).is_empty());
    }
}
