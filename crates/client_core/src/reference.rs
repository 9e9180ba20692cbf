use shared::{
    domain::{CaregiverId, DependentId, TransportId},
    protocol::{CaregiverSummary, DependentSummary, TransportSummary},
};
use tracing::warn;

use crate::{error::ClientError, session::SessionContext, BookingBackend};

pub const UNKNOWN_NAME: &str = "Unknown";

/// Lists the booking screen picks from, fetched once when it opens.
///
/// Caregiver and transport lists are best-effort: when they fail to load the
/// list stays empty and the matching `*_unavailable` flag is set so the view
/// can show a "none available" notice. Booking stays possible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub dependents: Vec<DependentSummary>,
    pub caregivers: Vec<CaregiverSummary>,
    pub transport: Vec<TransportSummary>,
    pub caregivers_unavailable: bool,
    pub transport_unavailable: bool,
}

impl ReferenceData {
    pub async fn load(
        backend: &dyn BookingBackend,
        context: &SessionContext,
    ) -> Result<Self, ClientError> {
        let dependents = backend.list_dependents(context.user_id).await?;

        let (caregivers, caregivers_unavailable) = match backend.list_caregivers().await {
            Ok(list) => (list, false),
            Err(err) => {
                warn!(error = %err, "reference: caregiver list unavailable");
                (Vec::new(), true)
            }
        };
        let (transport, transport_unavailable) = match backend.list_transport().await {
            Ok(list) => (list, false),
            Err(err) => {
                warn!(error = %err, "reference: transport list unavailable");
                (Vec::new(), true)
            }
        };

        Ok(Self {
            dependents,
            caregivers,
            transport,
            caregivers_unavailable,
            transport_unavailable,
        })
    }

    pub fn dependent_name(&self, id: DependentId) -> String {
        self.dependents
            .iter()
            .find(|d| d.id == id)
            .map(|d| full_name(&d.first_name, &d.surname))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    pub fn caregiver_name(&self, id: CaregiverId) -> String {
        self.caregivers
            .iter()
            .find(|c| c.id == id)
            .map(|c| full_name(&c.first_name, &c.surname))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }

    pub fn transport_name(&self, id: TransportId) -> String {
        self.transport
            .iter()
            .find(|t| t.id == id)
            .map(|t| full_name(&t.first_name, &t.surname))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    }
}

fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}
