//! Operator sessions
//!
//! A session only decides what the console shows. It is injected into pages
//! through [`SessionContext`]; nothing reads ambient storage directly.

use chrono::{DateTime, Utc};
use nightdesk_core::config::SessionConfig;
use nightdesk_core::types::{
    Artist, DeviceStatus, Employee, EmployeeRole, Event, PaymentMethod, PosDevice, Promotion,
    Ticket, TicketType, Transaction,
};
use nightdesk_core::{Error, RecordId, Resource, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Something an operator may be allowed to see or do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Revenue and fill-rate dashboard
    ViewDashboard,
    /// Events and ticket types
    ManageEvents,
    /// Artist roster
    ManageArtists,
    /// Promotion codes
    ManagePromotions,
    /// Employee accounts
    ManageStaff,
    /// POS devices
    ManageDevices,
    /// Issue tickets at the door or box office
    SellTickets,
    /// Scan and void tickets
    CheckInTickets,
    /// Ring up sales and top-ups
    ProcessPayments,
    /// Reverse completed transactions
    IssueRefunds,
}

impl Capability {
    /// Whether `role` carries this capability
    #[must_use]
    pub const fn granted_to(self, role: EmployeeRole) -> bool {
        match role {
            EmployeeRole::Manager => true,
            EmployeeRole::Cashier => matches!(
                self,
                Self::SellTickets | Self::CheckInTickets | Self::ProcessPayments | Self::IssueRefunds
            ),
            EmployeeRole::Bartender => matches!(self, Self::ProcessPayments),
            EmployeeRole::Security => matches!(self, Self::CheckInTickets),
            EmployeeRole::Promoter => matches!(
                self,
                Self::ViewDashboard | Self::ManageEvents | Self::ManageArtists | Self::ManagePromotions
            ),
        }
    }
}

/// Records whose page is editable only with a given capability
pub trait Managed: Resource {
    /// Capability required to create, edit or delete
    const MANAGE: Capability;
}

impl Managed for Event {
    const MANAGE: Capability = Capability::ManageEvents;
}

impl Managed for TicketType {
    const MANAGE: Capability = Capability::ManageEvents;
}

impl Managed for Ticket {
    const MANAGE: Capability = Capability::SellTickets;
}

impl Managed for Artist {
    const MANAGE: Capability = Capability::ManageArtists;
}

impl Managed for Promotion {
    const MANAGE: Capability = Capability::ManagePromotions;
}

impl Managed for PosDevice {
    const MANAGE: Capability = Capability::ManageDevices;
}

impl Managed for Employee {
    const MANAGE: Capability = Capability::ManageStaff;
}

impl Managed for Transaction {
    const MANAGE: Capability = Capability::ProcessPayments;
}

impl Managed for PaymentMethod {
    const MANAGE: Capability = Capability::ProcessPayments;
}

/// A signed-in operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier
    pub id: Uuid,
    /// Display name of the operator
    pub user_name: String,
    /// Role deciding what is visible
    pub role: EmployeeRole,
    /// POS device the session is bound to
    #[serde(default)]
    pub device_id: Option<RecordId>,
    /// Sign-in time
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Start a session now
    pub fn new(user_name: impl Into<String>, role: EmployeeRole, device_id: Option<RecordId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_name: user_name.into(),
            role,
            device_id,
            started_at: Utc::now(),
        }
    }

    /// Whether this operator may use `capability`
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        capability.granted_to(self.role)
    }
}

/// Persistence for the current session
pub trait SessionStore: Send + Sync {
    /// Stored session, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<Session>>;

    /// Replace the stored session
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, session: &Session) -> Result<()>;

    /// Forget the stored session
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<()>;
}

/// Session store living only in memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.session.lock().take();
        Ok(())
    }
}

/// Session store backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured path
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.path.clone())
    }

    /// File the session is kept in
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents).map(Some).map_err(|e| {
            Error::Session(format!(
                "session file {} is corrupt: {e}",
                self.path.display()
            ))
        })
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Current session plus where it is persisted, shared by every page
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    current: Arc<RwLock<Option<Session>>>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("current", &*self.current.read())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Context restored from `store`
    ///
    /// A corrupt stored session is discarded rather than treated as fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read at all.
    pub fn restore(store: Arc<dyn SessionStore>) -> Result<Self> {
        let current = match store.load() {
            Ok(session) => session,
            Err(Error::Session(message)) => {
                warn!(%message, "discarding unreadable session");
                store.clear()?;
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            store,
            current: Arc::new(RwLock::new(current)),
        })
    }

    /// Context with no one signed in and nothing persisted
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Context for `session`, kept only in memory
    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            current: Arc::new(RwLock::new(Some(session))),
        }
    }

    /// Signed-in operator, if any
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// Whether the signed-in operator may use `capability`
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.current
            .read()
            .as_ref()
            .is_some_and(|session| session.can(capability))
    }

    /// Make `session` current and persist it
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted; the current
    /// session is left unchanged in that case.
    pub fn sign_in(&self, session: Session) -> Result<()> {
        self.store.save(&session)?;
        info!(user = %session.user_name, role = session.role.as_str(), "signed in");
        *self.current.write() = Some(session);
        Ok(())
    }

    /// Forget the current session
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed.
    pub fn sign_out(&self) -> Result<()> {
        self.store.clear()?;
        if let Some(session) = self.current.write().take() {
            info!(user = %session.user_name, "signed out");
        }
        Ok(())
    }
}

/// Sign an employee in on a POS device
///
/// # Errors
///
/// Returns [`Error::Session`] if the employee is inactive or the device is
/// offline, or a storage error if the session cannot be persisted.
pub fn start_pos_session(
    context: &SessionContext,
    employee: &Employee,
    device: &PosDevice,
) -> Result<Session> {
    if !employee.active {
        return Err(Error::Session(format!("{} is not active", employee.name)));
    }
    if device.status == DeviceStatus::Offline {
        return Err(Error::Session(format!("{} is offline", device.name)));
    }

    let session = Session::new(employee.name.clone(), employee.role, Some(device.id));
    context.sign_in(session.clone())?;
    Ok(session)
}
