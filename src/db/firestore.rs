// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and coach profiles (canonical documents)
//! - The denormalized coach listing (public directory)
//! - Invitations (with transactional redemption)
//! - Submissions (with transactional claiming)
//! - Lessons, conversations, messages, subscriptions

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    Conversation, CoachProfile, Invitation, Lesson, ListingEntry, Message, PublishStatus,
    Submission, SubmissionStatus, Subscription, User,
};
use crate::time_utils::now_rfc3339;

const MAX_LIST_LIMIT: u32 = 200;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find a user by email (for invitation redemption by existing accounts).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_string();
        let mut results: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(results.pop())
    }

    // ─── Coach Profile Operations ────────────────────────────────

    /// Get a canonical coach profile.
    pub async fn get_coach_profile(&self, coach_id: &str) -> Result<Option<CoachProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COACH_PROFILES)
            .obj()
            .one(coach_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a canonical coach profile.
    pub async fn upsert_coach_profile(&self, profile: &CoachProfile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COACH_PROFILES)
            .document_id(&profile.coach_id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List all canonical coach profiles (admin validate-and-fix scan).
    pub async fn list_coach_profiles(&self) -> Result<Vec<CoachProfile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COACH_PROFILES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a slug is already taken by a different coach.
    pub async fn slug_in_use(&self, slug: &str, coach_id: &str) -> Result<bool, AppError> {
        let slug = slug.to_string();
        let results: Vec<CoachProfile> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COACH_PROFILES)
            .filter(move |q| q.for_all([q.field("slug").eq(slug.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(results.iter().any(|p| p.coach_id != coach_id))
    }

    // ─── Coach Listing Operations ────────────────────────────────

    /// Get a single listing entry by coach ID.
    pub async fn get_listing_entry(&self, coach_id: &str) -> Result<Option<ListingEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COACH_LISTING)
            .obj()
            .one(coach_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert a listing entry (the visibility fan-out write).
    pub async fn set_listing_entry(&self, entry: &ListingEntry) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COACH_LISTING)
            .document_id(&entry.coach_id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete an orphaned listing entry (no canonical profile behind it).
    pub async fn delete_listing_entry(&self, coach_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::COACH_LISTING)
            .document_id(coach_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List all listing entries (admin validate-and-fix scan).
    pub async fn list_listing_entries(&self) -> Result<Vec<ListingEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COACH_LISTING)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List visible directory entries, sorted by display name.
    pub async fn list_visible_listing(&self) -> Result<Vec<ListingEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COACH_LISTING)
            .filter(|q| q.for_all([q.field("visible").eq(true)]))
            .order_by([(
                "display_name",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a visible listing entry by slug.
    pub async fn get_listing_by_slug(&self, slug: &str) -> Result<Option<ListingEntry>, AppError> {
        let slug = slug.to_string();
        let mut results: Vec<ListingEntry> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COACH_LISTING)
            .filter(move |q| {
                q.for_all([q.field("slug").eq(slug.clone()), q.field("visible").eq(true)])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(results.pop())
    }

    // ─── Invitation Operations ───────────────────────────────────

    /// Get an invitation by token hash.
    pub async fn get_invitation(&self, token_hash: &str) -> Result<Option<Invitation>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::INVITATIONS)
            .obj()
            .one(token_hash)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update an invitation.
    pub async fn upsert_invitation(&self, invitation: &Invitation) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::INVITATIONS)
            .document_id(&invitation.token_hash)
            .object(invitation)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Atomically redeem an invitation: increment its use count and write the
    /// onboarded user in one transaction.
    ///
    /// Returns the redeemed invitation, or an error if the token is not
    /// redeemable. If two redemptions race on the last use, Firestore retries
    /// one of them with fresh data and it fails the `can_redeem` check.
    pub async fn redeem_invitation_atomic(
        &self,
        token_hash: &str,
        user: &User,
    ) -> Result<Invitation, AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        // 1. Read the invitation within the transaction scope
        let invitation: Option<Invitation> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::INVITATIONS)
            .obj()
            .one(token_hash)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read invitation in transaction: {}", e))
            })?;

        let mut invitation = match invitation {
            Some(i) => i,
            None => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound("Invitation not found".to_string()));
            }
        };

        // 2. Check redeemability with fresh data
        if !invitation.can_redeem(chrono::Utc::now()) {
            let _ = transaction.rollback().await;
            return Err(AppError::BadRequest(
                "Invitation is expired, revoked, or fully used".to_string(),
            ));
        }

        invitation.use_count += 1;

        // 3. Add invitation write to transaction
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::INVITATIONS)
            .document_id(token_hash)
            .object(&invitation)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add invitation to transaction: {}", e))
            })?;

        // 4. Add user write to transaction
        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add user to transaction: {}", e)))?;

        // 5. Commit atomically
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %user.user_id,
            use_count = invitation.use_count,
            max_uses = invitation.max_uses,
            "Invitation redeemed atomically"
        );

        Ok(invitation)
    }

    // ─── Submission Operations ───────────────────────────────────

    /// Get a submission by ID.
    pub async fn get_submission(&self, submission_id: &str) -> Result<Option<Submission>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBMISSIONS)
            .obj()
            .one(submission_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a submission.
    pub async fn set_submission(&self, submission: &Submission) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBMISSIONS)
            .document_id(&submission.submission_id)
            .object(submission)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List an athlete's own submissions, newest first.
    pub async fn list_submissions_for_athlete(
        &self,
        athlete_id: &str,
    ) -> Result<Vec<Submission>, AppError> {
        let athlete_id = athlete_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBMISSIONS)
            .filter(move |q| q.for_all([q.field("athlete_id").eq(athlete_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_LIST_LIMIT)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List unclaimed submissions (the coach work queue), oldest first.
    pub async fn list_pending_submissions(&self) -> Result<Vec<Submission>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBMISSIONS)
            .filter(|q| q.for_all([q.field("status").eq("pending")]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .limit(MAX_LIST_LIMIT)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List submissions claimed by a coach, newest first.
    pub async fn list_submissions_for_coach(
        &self,
        coach_id: &str,
    ) -> Result<Vec<Submission>, AppError> {
        let coach_id = coach_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBMISSIONS)
            .filter(move |q| q.for_all([q.field("coach_id").eq(coach_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_LIST_LIMIT)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically claim a pending submission for a coach.
    ///
    /// First-coach-wins: the transaction re-reads the submission, so a racing
    /// claim sees `Claimed` on retry and fails the transition check.
    pub async fn claim_submission_atomic(
        &self,
        submission_id: &str,
        coach_id: &str,
    ) -> Result<Submission, AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let submission: Option<Submission> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBMISSIONS)
            .obj()
            .one(submission_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read submission in transaction: {}", e))
            })?;

        let mut submission = match submission {
            Some(s) => s,
            None => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!(
                    "Submission {} not found",
                    submission_id
                )));
            }
        };

        if !submission.status.can_transition_to(SubmissionStatus::Claimed) {
            let _ = transaction.rollback().await;
            return Err(AppError::BadRequest(format!(
                "Submission is not pending (status: {:?})",
                submission.status
            )));
        }

        submission.status = SubmissionStatus::Claimed;
        submission.coach_id = Some(coach_id.to_string());
        submission.claimed_at = Some(now_rfc3339());

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBMISSIONS)
            .document_id(submission_id)
            .object(&submission)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add submission to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(submission_id, coach_id, "Submission claimed atomically");

        Ok(submission)
    }

    // ─── Lesson Operations ───────────────────────────────────────

    /// Get a lesson by ID.
    pub async fn get_lesson(&self, lesson_id: &str) -> Result<Option<Lesson>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LESSONS)
            .obj()
            .one(lesson_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a lesson.
    pub async fn set_lesson(&self, lesson: &Lesson) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LESSONS)
            .document_id(&lesson.lesson_id)
            .object(lesson)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a lesson.
    pub async fn delete_lesson(&self, lesson_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LESSONS)
            .document_id(lesson_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List a coach's own lessons (all statuses), newest first.
    pub async fn list_lessons_for_coach(&self, coach_id: &str) -> Result<Vec<Lesson>, AppError> {
        let coach_id = coach_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::LESSONS)
            .filter(move |q| q.for_all([q.field("coach_id").eq(coach_id.clone())]))
            .order_by([("updated_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_LIST_LIMIT)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a coach's published lessons (what an assigned athlete sees).
    pub async fn list_published_lessons(&self, coach_id: &str) -> Result<Vec<Lesson>, AppError> {
        let lessons = self.list_lessons_for_coach(coach_id).await?;
        Ok(lessons
            .into_iter()
            .filter(|l| l.status == PublishStatus::Published)
            .collect())
    }

    // ─── Conversation / Message Operations ───────────────────────

    /// Get a conversation by its derived ID.
    pub async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CONVERSATIONS)
            .obj()
            .one(conversation_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a conversation.
    pub async fn upsert_conversation(&self, conversation: &Conversation) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CONVERSATIONS)
            .document_id(&conversation.conversation_id)
            .object(conversation)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List a user's conversations, most recently active first.
    pub async fn list_conversations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Conversation>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CONVERSATIONS)
            .filter(move |q| {
                q.for_all([q.field("participant_ids").array_contains(user_id.clone())])
            })
            .order_by([("updated_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(MAX_LIST_LIMIT)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a message.
    pub async fn set_message(&self, message: &Message) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MESSAGES)
            .document_id(&message.message_id)
            .object(message)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List messages in a conversation, oldest first.
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> Result<Vec<Message>, AppError> {
        let conversation_id = conversation_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .filter(move |q| {
                q.for_all([q.field("conversation_id").eq(conversation_id.clone())])
            })
            .order_by([("sent_at", firestore::FirestoreQueryDirection::Ascending)])
            .limit(limit.min(MAX_LIST_LIMIT))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Subscription Operations ─────────────────────────────────

    /// Get the subscription mirror for a user.
    pub async fn get_subscription(&self, user_id: &str) -> Result<Option<Subscription>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBSCRIPTIONS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert the subscription mirror for a user.
    pub async fn set_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBSCRIPTIONS)
            .document_id(&subscription.user_id)
            .object(subscription)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find a subscription by Stripe customer ID (webhook lookups).
    pub async fn get_subscription_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let customer_id = customer_id.to_string();
        let mut results: Vec<Subscription> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| {
                q.for_all([q.field("stripe_customer_id").eq(customer_id.clone())])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(results.pop())
    }
}
