//! Role dashboards.
//!
//! Each dashboard is gated on the viewer's role when loaded, holds the last
//! successfully fetched lists, and re-fetches after every mutation. A failed
//! fetch or action leaves the previously loaded state in place.

use crate::appointments::AppointmentClient;
use crate::context::AuthContext;
use crate::error::{Error, Result};
use crate::model::{
    available_actions, Appointment, AppointmentAction, AppointmentStats, AppointmentStatus,
    Identity, Role,
};
use crate::storage::SessionStorage;
use crate::transport::Transport;
use crate::users::UserClient;

/// Tabs on the customer's appointment list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CustomerTab {
    #[default]
    All,
    Upcoming,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl CustomerTab {
    pub const ALL: [CustomerTab; 6] = [
        CustomerTab::All,
        CustomerTab::Upcoming,
        CustomerTab::Pending,
        CustomerTab::Confirmed,
        CustomerTab::Completed,
        CustomerTab::Cancelled,
    ];

    fn status(&self) -> Option<AppointmentStatus> {
        match self {
            CustomerTab::Pending => Some(AppointmentStatus::Pending),
            CustomerTab::Confirmed => Some(AppointmentStatus::Confirmed),
            CustomerTab::Completed => Some(AppointmentStatus::Completed),
            CustomerTab::Cancelled => Some(AppointmentStatus::Cancelled),
            CustomerTab::All | CustomerTab::Upcoming => None,
        }
    }
}

/// Check `action` is offered to `role` on appointment `id` in `list`.
fn permitted(
    list: &[Appointment],
    id: i64,
    role: Role,
    action: AppointmentAction,
) -> Result<AppointmentStatus> {
    let apt = list
        .iter()
        .find(|apt| apt.id == id)
        .ok_or_else(|| Error::NotFound(format!("Appointment {} is not on this dashboard", id)))?;

    if !available_actions(role, apt.status).contains(&action) {
        return Err(Error::Validation(format!(
            "Cannot {} an appointment that is {}",
            action.label().to_lowercase(),
            apt.status.display_name().to_lowercase()
        )));
    }

    action
        .target_status()
        .ok_or_else(|| Error::Validation(format!("{} does not change status", action.label())))
}

// ============================================================================
// Customer
// ============================================================================

/// A customer's own appointments.
pub struct CustomerDashboard<T: Transport> {
    client: AppointmentClient<T>,
    customer: Identity,
    appointments: Vec<Appointment>,
    upcoming: Vec<Appointment>,
}

impl<T: Transport> CustomerDashboard<T> {
    /// # Errors
    /// - `Error::Unauthorized` / `Error::Forbidden`: viewer is not a customer
    /// - any fetch error
    pub async fn load<S: SessionStorage>(
        ctx: &AuthContext<T, S>,
        client: AppointmentClient<T>,
    ) -> Result<Self> {
        let customer = ctx.require_role(Role::Customer)?;
        let mut dashboard = CustomerDashboard {
            client,
            customer,
            appointments: Vec::new(),
            upcoming: Vec::new(),
        };
        dashboard.refresh().await?;
        Ok(dashboard)
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let id = self.customer.id;
        let (appointments, upcoming) = futures::try_join!(
            self.client.list_by_customer(id),
            self.client.list_upcoming(id)
        )?;
        self.appointments = appointments;
        self.upcoming = upcoming;
        debug!(
            "✓ Customer {} dashboard: {} appointments, {} upcoming",
            id,
            self.appointments.len(),
            self.upcoming.len()
        );
        Ok(())
    }

    pub fn customer(&self) -> &Identity {
        &self.customer
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn stats(&self) -> AppointmentStats {
        AppointmentStats::from_appointments(&self.appointments)
    }

    pub fn filter(&self, tab: CustomerTab) -> Vec<&Appointment> {
        match tab {
            CustomerTab::All => self.appointments.iter().collect(),
            CustomerTab::Upcoming => self.upcoming.iter().collect(),
            _ => self
                .appointments
                .iter()
                .filter(|apt| Some(apt.status) == tab.status())
                .collect(),
        }
    }

    /// Cancel a pending or confirmed appointment, then re-fetch.
    pub async fn cancel(&mut self, id: i64) -> Result<()> {
        let status = permitted(&self.appointments, id, Role::Customer, AppointmentAction::Cancel)?;
        self.client.set_status(id, status).await?;
        info!("✓ Customer {} cancelled appointment {}", self.customer.id, id);
        self.refresh().await
    }
}

// ============================================================================
// Service provider
// ============================================================================

/// Appointments booked with a service provider.
pub struct ProviderDashboard<T: Transport> {
    client: AppointmentClient<T>,
    provider: Identity,
    appointments: Vec<Appointment>,
}

impl<T: Transport> ProviderDashboard<T> {
    pub async fn load<S: SessionStorage>(
        ctx: &AuthContext<T, S>,
        client: AppointmentClient<T>,
    ) -> Result<Self> {
        let provider = ctx.require_role(Role::ServiceProvider)?;
        let mut dashboard = ProviderDashboard {
            client,
            provider,
            appointments: Vec::new(),
        };
        dashboard.refresh().await?;
        Ok(dashboard)
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.appointments = self.client.list_by_provider(self.provider.id).await?;
        Ok(())
    }

    pub fn provider(&self) -> &Identity {
        &self.provider
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn stats(&self) -> AppointmentStats {
        AppointmentStats::from_appointments(&self.appointments)
    }

    /// Bookings awaiting the provider's answer.
    pub fn pending(&self) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|apt| apt.status == AppointmentStatus::Pending)
            .collect()
    }

    pub async fn confirm(&mut self, id: i64) -> Result<()> {
        self.act(id, AppointmentAction::Confirm).await
    }

    pub async fn decline(&mut self, id: i64) -> Result<()> {
        self.act(id, AppointmentAction::Decline).await
    }

    pub async fn complete(&mut self, id: i64) -> Result<()> {
        self.act(id, AppointmentAction::Complete).await
    }

    async fn act(&mut self, id: i64, action: AppointmentAction) -> Result<()> {
        let status = permitted(&self.appointments, id, Role::ServiceProvider, action)?;
        self.client.set_status(id, status).await?;
        info!(
            "✓ Provider {} applied {:?} to appointment {}",
            self.provider.id, action, id
        );
        self.refresh().await
    }
}

// ============================================================================
// Admin
// ============================================================================

/// System-wide view: statistics, every appointment and every user.
pub struct AdminDashboard<T: Transport> {
    appointments_client: AppointmentClient<T>,
    users_client: UserClient<T>,
    stats: AppointmentStats,
    appointments: Vec<Appointment>,
    users: Vec<Identity>,
}

impl<T: Transport> AdminDashboard<T> {
    pub async fn load<S: SessionStorage>(
        ctx: &AuthContext<T, S>,
        appointments_client: AppointmentClient<T>,
        users_client: UserClient<T>,
    ) -> Result<Self> {
        ctx.require_role(Role::Admin)?;
        let mut dashboard = AdminDashboard {
            appointments_client,
            users_client,
            stats: AppointmentStats::default(),
            appointments: Vec::new(),
            users: Vec::new(),
        };
        dashboard.refresh().await?;
        Ok(dashboard)
    }

    /// Fetch statistics, appointments and users concurrently.
    ///
    /// Nothing is replaced unless all three succeed.
    pub async fn refresh(&mut self) -> Result<()> {
        let (stats, appointments, users) = futures::try_join!(
            self.appointments_client.statistics(),
            self.appointments_client.list(),
            self.users_client.list()
        )?;
        self.stats = stats;
        self.appointments = appointments;
        self.users = users;
        Ok(())
    }

    pub fn stats(&self) -> AppointmentStats {
        self.stats
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn users(&self) -> &[Identity] {
        &self.users
    }

    pub async fn delete_appointment(&mut self, id: i64) -> Result<()> {
        self.appointments_client.remove(id).await?;
        info!("✓ Admin deleted appointment {}", id);
        self.refresh().await
    }

    pub async fn delete_user(&mut self, id: i64) -> Result<()> {
        self.users_client.remove(id).await?;
        info!("✓ Admin deleted user {}", id);
        self.refresh().await
    }
}
