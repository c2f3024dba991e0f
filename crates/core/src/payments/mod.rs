//! Payment tracking for musicians' fees

use std::collections::BTreeMap;

use chrono::Utc;
use encore_domain::{
    ActivityType, CurrencyTotals, EarningsLine, Gig, GigRole, InvitationStatus,
    MusicianEarnings, NewNotification, NotificationKind, PaymentStatus, PaymentSummary, Result,
};
use serde_json::json;
use tracing::instrument;

use crate::access::GigAccess;
use crate::activity::ActivityLogger;
use crate::notifications::NotificationService;

pub struct PaymentService {
    access: GigAccess,
    activity: ActivityLogger,
    notifications: NotificationService,
}

impl PaymentService {
    pub fn new(
        access: GigAccess,
        activity: ActivityLogger,
        notifications: NotificationService,
    ) -> Self {
        Self { access, activity, notifications }
    }

    /// Mark a role paid or unpaid.
    #[instrument(skip(self), fields(owner_id = %owner_id, role_id = %role_id))]
    pub async fn mark_role_payment(
        &self,
        owner_id: &str,
        role_id: &str,
        paid: bool,
    ) -> Result<GigRole> {
        let (mut role, gig) = self.access.role_with_gig(role_id).await?;
        self.access.owned(owner_id, &gig.id).await?;

        let status = if paid { PaymentStatus::Paid } else { PaymentStatus::Unpaid };
        if role.payment_status == status {
            return Ok(role);
        }

        let now = Utc::now();
        role.payment_status = status;
        role.paid_at = paid.then_some(now);
        role.updated_at = now;
        self.access.roles().update(&role).await?;

        self.activity
            .record(
                &gig.id,
                owner_id,
                ActivityType::PaymentRecorded,
                format!("Marked {} as {status}", role.display_name()),
                json!({ "roleId": role.id, "amountCents": role.agreed_fee_cents }),
            )
            .await;

        if paid {
            if let Some(musician_id) = role.musician_id.as_deref().filter(|m| *m != owner_id) {
                let amount = role
                    .agreed_fee_cents
                    .map(|cents| format_amount(cents, &gig.currency))
                    .unwrap_or_else(|| "Your fee".to_string());
                self.notifications
                    .notify(
                        NewNotification::new(
                            musician_id,
                            NotificationKind::PaymentReceived,
                            format!("Payment received for {}", gig.title),
                        )
                        .with_body(format!("{amount} marked as paid"))
                        .for_gig(&gig.id)
                        .dedupe_key(format!("payment_received:{}:{}", gig.id, role.id)),
                    )
                    .await;
            }
        }

        Ok(role)
    }

    pub async fn gig_payment_summary(&self, owner_id: &str, gig_id: &str) -> Result<PaymentSummary> {
        let gig = self.access.owned(owner_id, gig_id).await?;
        let roles = self.access.roles().list_by_gig(gig_id).await?;
        Ok(summarize_payments(&gig, &roles))
    }

    /// Fees across the user's accepted roles, totalled per currency.
    pub async fn my_earnings(&self, user_id: &str) -> Result<MusicianEarnings> {
        let invitations = self.access.roles().list_invitations(user_id).await?;
        let mut lines: Vec<EarningsLine> = invitations
            .into_iter()
            .filter(|inv| inv.role.invitation_status == InvitationStatus::Accepted)
            .filter(|inv| !inv.gig.is_cancelled())
            .filter_map(|inv| {
                let fee_cents = inv.role.agreed_fee_cents?;
                Some(EarningsLine {
                    gig_id: inv.gig.id,
                    gig_title: inv.gig.title,
                    gig_date: inv.gig.date,
                    role_id: inv.role.id,
                    currency: inv.gig.currency,
                    fee_cents,
                    payment_status: inv.role.payment_status,
                    paid_at: inv.role.paid_at,
                })
            })
            .collect();
        lines.sort_by(|a, b| b.gig_date.cmp(&a.gig_date));

        let mut totals: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for line in &lines {
            let entry = totals.entry(line.currency.clone()).or_default();
            match line.payment_status {
                PaymentStatus::Paid => entry.0 += line.fee_cents,
                PaymentStatus::Unpaid => entry.1 += line.fee_cents,
            }
        }
        let totals = totals
            .into_iter()
            .map(|(currency, (paid_cents, outstanding_cents))| CurrencyTotals {
                currency,
                paid_cents,
                outstanding_cents,
            })
            .collect();

        Ok(MusicianEarnings { totals, lines })
    }
}

/// Totals over the gig's active roles that carry a fee.
pub fn summarize_payments(gig: &Gig, roles: &[GigRole]) -> PaymentSummary {
    let mut summary = PaymentSummary {
        gig_id: gig.id.clone(),
        currency: gig.currency.clone(),
        total_agreed_cents: 0,
        paid_cents: 0,
        outstanding_cents: 0,
        roles_paid: 0,
        roles_unpaid: 0,
    };

    for role in roles.iter().filter(|r| r.invitation_status.is_active()) {
        let Some(fee) = role.agreed_fee_cents else { continue };
        summary.total_agreed_cents += fee;
        match role.payment_status {
            PaymentStatus::Paid => {
                summary.paid_cents += fee;
                summary.roles_paid += 1;
            }
            PaymentStatus::Unpaid => {
                summary.outstanding_cents += fee;
                summary.roles_unpaid += 1;
            }
        }
    }
    summary
}

fn format_amount(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02} {currency}", abs / 100, abs % 100)
}
