//! Core data types for the `NightDesk` console
//!
//! Every backend resource has three shapes: the persisted record (carrying the
//! server-assigned identifier), an insert payload without identifier, and a
//! partial patch where `None` leaves a field unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use validator::{Validate, ValidationError};

/// Server-assigned record identifier
pub type RecordId = i64;

/// Contract tying a record type to its payloads and REST collection
pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Payload sent to create a record
    type Insert: fmt::Debug + Serialize + Validate + Send + Sync;

    /// Partial update payload
    type Patch: fmt::Debug + Serialize + Validate + Send + Sync;

    /// Path segment of the REST collection, e.g. `events`
    const COLLECTION: &'static str;

    /// Human-readable singular name used in messages
    const LABEL: &'static str;

    /// Identifier assigned by the server
    fn id(&self) -> RecordId;

    /// Build the record the server would return for a create call
    fn from_insert(id: RecordId, payload: &Self::Insert) -> Self;

    /// Apply the provided fields of a patch
    fn apply_patch(&mut self, patch: &Self::Patch);
}

fn non_negative(value: Decimal, code: &'static str) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new(code);
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

fn patch<T: Clone>(slot: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        slot.clone_from(value);
    }
}

fn patch_opt<T: Clone>(slot: &mut Option<T>, value: Option<&T>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}

// ========================
// Events
// ========================

/// Event lifecycle status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Scheduled in the future
    #[default]
    Upcoming,
    /// Doors are open
    Live,
    /// Already happened
    Past,
    /// Called off
    Cancelled,
}

impl EventStatus {
    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Live => "live",
            Self::Past => "past",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled event at a venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub id: RecordId,
    /// Display name
    pub name: String,
    /// Longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Venue name
    pub venue: String,
    /// Category such as `concert` or `club_night`
    pub category: String,
    /// Lifecycle status
    #[serde(default)]
    pub status: EventStatus,
    /// Door time
    pub starts_at: DateTime<Utc>,
    /// Closing time
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Maximum attendance
    pub capacity: u32,
    /// Tickets sold so far
    #[serde(default)]
    pub tickets_sold: u32,
}

/// Payload for creating an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_new_event_window"))]
pub struct NewEvent {
    /// Display name
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub name: String,
    /// Longer description
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Venue name
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub venue: String,
    /// Category
    #[validate(length(min = 1, max = 60, message = "must not be empty"))]
    pub category: String,
    /// Door time
    pub starts_at: DateTime<Utc>,
    /// Closing time
    pub ends_at: Option<DateTime<Utc>>,
    /// Maximum attendance
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub capacity: u32,
}

fn validate_new_event_window(event: &NewEvent) -> Result<(), ValidationError> {
    match event.ends_at {
        Some(ends_at) if ends_at <= event.starts_at => {
            let mut err = ValidationError::new("ends_at");
            err.message = Some("must be after the start time".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Partial update for an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EventPatch {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub name: Option<String>,
    /// Longer description
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Venue name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub venue: Option<String>,
    /// Category
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 60, message = "must not be empty"))]
    pub category: Option<String>,
    /// Lifecycle status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    /// Door time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    /// Closing time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Maximum attendance
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub capacity: Option<u32>,
}

impl Resource for Event {
    type Insert = NewEvent;
    type Patch = EventPatch;
    const COLLECTION: &'static str = "events";
    const LABEL: &'static str = "Event";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewEvent) -> Self {
        Self {
            id,
            name: payload.name.clone(),
            description: payload.description.clone(),
            venue: payload.venue.clone(),
            category: payload.category.clone(),
            status: EventStatus::Upcoming,
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
            capacity: payload.capacity,
            tickets_sold: 0,
        }
    }

    fn apply_patch(&mut self, p: &EventPatch) {
        patch(&mut self.name, p.name.as_ref());
        patch_opt(&mut self.description, p.description.as_ref());
        patch(&mut self.venue, p.venue.as_ref());
        patch(&mut self.category, p.category.as_ref());
        patch(&mut self.status, p.status.as_ref());
        patch(&mut self.starts_at, p.starts_at.as_ref());
        patch_opt(&mut self.ends_at, p.ends_at.as_ref());
        patch(&mut self.capacity, p.capacity.as_ref());
    }
}

// ========================
// Ticket types and tickets
// ========================

/// A priced ticket tier for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    /// Unique identifier
    pub id: RecordId,
    /// Owning event
    pub event_id: RecordId,
    /// Tier name, e.g. `Early Bird`
    pub name: String,
    /// Unit price
    pub price: Decimal,
    /// Tickets available in this tier
    pub quantity: u32,
    /// Tickets sold in this tier
    #[serde(default)]
    pub sold: u32,
    /// Whether the tier is on sale
    #[serde(default = "default_true")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

/// Payload for creating a ticket type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_new_ticket_type_price"))]
pub struct NewTicketType {
    /// Owning event
    pub event_id: RecordId,
    /// Tier name
    #[validate(length(min = 1, max = 80, message = "must not be empty"))]
    pub name: String,
    /// Unit price
    pub price: Decimal,
    /// Tickets available
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: u32,
}

fn validate_new_ticket_type_price(tier: &NewTicketType) -> Result<(), ValidationError> {
    non_negative(tier.price, "price")
}

/// Partial update for a ticket type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_ticket_type_patch_price"))]
pub struct TicketTypePatch {
    /// Tier name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 80, message = "must not be empty"))]
    pub name: Option<String>,
    /// Unit price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Tickets available
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: Option<u32>,
    /// Whether the tier is on sale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

fn validate_ticket_type_patch_price(tier: &TicketTypePatch) -> Result<(), ValidationError> {
    tier.price.map_or(Ok(()), |price| non_negative(price, "price"))
}

impl Resource for TicketType {
    type Insert = NewTicketType;
    type Patch = TicketTypePatch;
    const COLLECTION: &'static str = "ticket-types";
    const LABEL: &'static str = "Ticket type";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewTicketType) -> Self {
        Self {
            id,
            event_id: payload.event_id,
            name: payload.name.clone(),
            price: payload.price,
            quantity: payload.quantity,
            sold: 0,
            active: true,
        }
    }

    fn apply_patch(&mut self, p: &TicketTypePatch) {
        patch(&mut self.name, p.name.as_ref());
        patch(&mut self.price, p.price.as_ref());
        patch(&mut self.quantity, p.quantity.as_ref());
        patch(&mut self.active, p.active.as_ref());
    }
}

/// Ticket lifecycle status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Issued and not yet scanned
    #[default]
    Valid,
    /// Scanned at the door
    Used,
    /// Money returned
    Refunded,
    /// Voided without refund
    Cancelled,
}

impl TicketStatus {
    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Used => "used",
            Self::Refunded => "refunded",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A ticket held by an attendee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier
    pub id: RecordId,
    /// Event the ticket admits to
    pub event_id: RecordId,
    /// Tier the ticket was sold from
    pub ticket_type_id: RecordId,
    /// Attendee name
    pub holder_name: String,
    /// Attendee email
    pub holder_email: String,
    /// Lifecycle status
    #[serde(default)]
    pub status: TicketStatus,
    /// Price actually paid
    pub price_paid: Decimal,
    /// Purchase time
    pub purchased_at: DateTime<Utc>,
}

/// Payload for issuing a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_new_ticket_price"))]
pub struct NewTicket {
    /// Event the ticket admits to
    pub event_id: RecordId,
    /// Tier the ticket is sold from
    pub ticket_type_id: RecordId,
    /// Attendee name
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub holder_name: String,
    /// Attendee email
    #[validate(email(message = "must be a valid email address"))]
    pub holder_email: String,
    /// Price actually paid
    pub price_paid: Decimal,
}

fn validate_new_ticket_price(ticket: &NewTicket) -> Result<(), ValidationError> {
    non_negative(ticket.price_paid, "price_paid")
}

/// Partial update for a ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TicketPatch {
    /// Attendee name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub holder_name: Option<String>,
    /// Attendee email
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "must be a valid email address"))]
    pub holder_email: Option<String>,
    /// Lifecycle status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

impl Resource for Ticket {
    type Insert = NewTicket;
    type Patch = TicketPatch;
    const COLLECTION: &'static str = "tickets";
    const LABEL: &'static str = "Ticket";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewTicket) -> Self {
        Self {
            id,
            event_id: payload.event_id,
            ticket_type_id: payload.ticket_type_id,
            holder_name: payload.holder_name.clone(),
            holder_email: payload.holder_email.clone(),
            status: TicketStatus::Valid,
            price_paid: payload.price_paid,
            purchased_at: Utc::now(),
        }
    }

    fn apply_patch(&mut self, p: &TicketPatch) {
        patch(&mut self.holder_name, p.holder_name.as_ref());
        patch(&mut self.holder_email, p.holder_email.as_ref());
        patch(&mut self.status, p.status.as_ref());
    }
}

// ========================
// Artists
// ========================

/// A performer that can be booked for events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    /// Unique identifier
    pub id: RecordId,
    /// Stage name
    pub name: String,
    /// Musical genre
    pub genre: String,
    /// Short biography
    #[serde(default)]
    pub bio: Option<String>,
    /// Fee per booking
    pub booking_fee: Decimal,
}

/// Payload for adding an artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_new_artist_fee"))]
pub struct NewArtist {
    /// Stage name
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub name: String,
    /// Musical genre
    #[validate(length(min = 1, max = 60, message = "must not be empty"))]
    pub genre: String,
    /// Short biography
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    /// Fee per booking
    pub booking_fee: Decimal,
}

fn validate_new_artist_fee(artist: &NewArtist) -> Result<(), ValidationError> {
    non_negative(artist.booking_fee, "booking_fee")
}

/// Partial update for an artist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_artist_patch_fee"))]
pub struct ArtistPatch {
    /// Stage name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub name: Option<String>,
    /// Musical genre
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 60, message = "must not be empty"))]
    pub genre: Option<String>,
    /// Short biography
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    /// Fee per booking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_fee: Option<Decimal>,
}

fn validate_artist_patch_fee(artist: &ArtistPatch) -> Result<(), ValidationError> {
    artist
        .booking_fee
        .map_or(Ok(()), |fee| non_negative(fee, "booking_fee"))
}

impl Resource for Artist {
    type Insert = NewArtist;
    type Patch = ArtistPatch;
    const COLLECTION: &'static str = "artists";
    const LABEL: &'static str = "Artist";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewArtist) -> Self {
        Self {
            id,
            name: payload.name.clone(),
            genre: payload.genre.clone(),
            bio: payload.bio.clone(),
            booking_fee: payload.booking_fee,
        }
    }

    fn apply_patch(&mut self, p: &ArtistPatch) {
        patch(&mut self.name, p.name.as_ref());
        patch(&mut self.genre, p.genre.as_ref());
        patch_opt(&mut self.bio, p.bio.as_ref());
        patch(&mut self.booking_fee, p.booking_fee.as_ref());
    }
}

// ========================
// Promotions
// ========================

/// Discount granted by a promotion code
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage off, `0..=100`
    Percentage(Decimal),
    /// Fixed amount off
    Fixed(Decimal),
}

impl Discount {
    /// Price after applying the discount, never below zero
    #[must_use]
    pub fn apply(self, price: Decimal) -> Decimal {
        let discounted = match self {
            Self::Percentage(pct) => price - price * pct / Decimal::ONE_HUNDRED,
            Self::Fixed(amount) => price - amount,
        };
        discounted.max(Decimal::ZERO)
    }

    fn check(self) -> Result<(), ValidationError> {
        match self {
            Self::Percentage(pct) if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED => {
                let mut err = ValidationError::new("discount");
                err.message = Some("percentage must be between 0 and 100".into());
                Err(err)
            }
            Self::Percentage(_) => Ok(()),
            Self::Fixed(amount) => non_negative(amount, "discount"),
        }
    }
}

/// A discount code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Unique identifier
    pub id: RecordId,
    /// Code typed at checkout
    pub code: String,
    /// Internal description
    #[serde(default)]
    pub description: String,
    /// Discount granted
    pub discount: Discount,
    /// Restrict to a single event
    #[serde(default)]
    pub event_id: Option<RecordId>,
    /// Whether the code can be redeemed
    #[serde(default = "default_true")]
    pub active: bool,
    /// Redemption limit
    #[serde(default)]
    pub max_uses: Option<u32>,
    /// Redemptions so far
    #[serde(default)]
    pub uses: u32,
}

impl Promotion {
    /// Whether the code can still be redeemed
    #[must_use]
    pub fn is_redeemable(&self) -> bool {
        self.active && self.max_uses.is_none_or(|max| self.uses < max)
    }
}

/// Payload for creating a promotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_new_promotion_discount"))]
pub struct NewPromotion {
    /// Code typed at checkout
    #[validate(length(min = 3, max = 32, message = "must be 3 to 32 characters"))]
    pub code: String,
    /// Internal description
    #[validate(length(max = 500))]
    pub description: String,
    /// Discount granted
    pub discount: Discount,
    /// Restrict to a single event
    pub event_id: Option<RecordId>,
    /// Redemption limit
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_uses: Option<u32>,
}

fn validate_new_promotion_discount(promo: &NewPromotion) -> Result<(), ValidationError> {
    promo.discount.check()
}

/// Partial update for a promotion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_promotion_patch_discount"))]
pub struct PromotionPatch {
    /// Internal description
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Discount granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    /// Whether the code can be redeemed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Redemption limit
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_uses: Option<u32>,
}

fn validate_promotion_patch_discount(promo: &PromotionPatch) -> Result<(), ValidationError> {
    promo.discount.map_or(Ok(()), Discount::check)
}

impl Resource for Promotion {
    type Insert = NewPromotion;
    type Patch = PromotionPatch;
    const COLLECTION: &'static str = "promotions";
    const LABEL: &'static str = "Promotion";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewPromotion) -> Self {
        Self {
            id,
            code: payload.code.clone(),
            description: payload.description.clone(),
            discount: payload.discount,
            event_id: payload.event_id,
            active: true,
            max_uses: payload.max_uses,
            uses: 0,
        }
    }

    fn apply_patch(&mut self, p: &PromotionPatch) {
        patch(&mut self.description, p.description.as_ref());
        patch(&mut self.discount, p.discount.as_ref());
        patch(&mut self.active, p.active.as_ref());
        patch_opt(&mut self.max_uses, p.max_uses.as_ref());
    }
}

// ========================
// POS devices and employees
// ========================

/// Connectivity status of a POS terminal
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Reachable and taking payments
    Online,
    /// Not reachable
    #[default]
    Offline,
    /// Taken out of service
    Maintenance,
}

impl DeviceStatus {
    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Maintenance => "maintenance",
        }
    }
}

/// A point-of-sale terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosDevice {
    /// Unique identifier
    pub id: RecordId,
    /// Friendly name, e.g. `Main Bar 1`
    pub name: String,
    /// Hardware serial number
    pub serial_number: String,
    /// Where the device is placed
    pub location: String,
    /// Connectivity status
    #[serde(default)]
    pub status: DeviceStatus,
    /// Last heartbeat
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// Payload for registering a POS device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewPosDevice {
    /// Friendly name
    #[validate(length(min = 1, max = 80, message = "must not be empty"))]
    pub name: String,
    /// Hardware serial number
    #[validate(length(min = 4, max = 64, message = "must be 4 to 64 characters"))]
    pub serial_number: String,
    /// Where the device is placed
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub location: String,
}

/// Partial update for a POS device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PosDevicePatch {
    /// Friendly name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 80, message = "must not be empty"))]
    pub name: Option<String>,
    /// Where the device is placed
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub location: Option<String>,
    /// Connectivity status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
}

impl Resource for PosDevice {
    type Insert = NewPosDevice;
    type Patch = PosDevicePatch;
    const COLLECTION: &'static str = "pos-devices";
    const LABEL: &'static str = "POS device";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewPosDevice) -> Self {
        Self {
            id,
            name: payload.name.clone(),
            serial_number: payload.serial_number.clone(),
            location: payload.location.clone(),
            status: DeviceStatus::Offline,
            last_seen_at: None,
        }
    }

    fn apply_patch(&mut self, p: &PosDevicePatch) {
        patch(&mut self.name, p.name.as_ref());
        patch(&mut self.location, p.location.as_ref());
        patch(&mut self.status, p.status.as_ref());
    }
}

/// Staff role, used for visibility gating
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    /// Full access
    Manager,
    /// Runs a POS till
    Cashier,
    /// Serves drinks from a POS till
    Bartender,
    /// Door and floor staff
    Security,
    /// Sells tickets and promotions
    Promoter,
}

impl EmployeeRole {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Cashier => "cashier",
            Self::Bartender => "bartender",
            Self::Security => "security",
            Self::Promoter => "promoter",
        }
    }
}

/// A staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier
    pub id: RecordId,
    /// Full name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Staff role
    pub role: EmployeeRole,
    /// Whether the employee may sign in
    #[serde(default = "default_true")]
    pub active: bool,
    /// Device the employee is assigned to
    #[serde(default)]
    pub device_id: Option<RecordId>,
}

/// Payload for hiring an employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewEmployee {
    /// Full name
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub name: String,
    /// Contact email
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Staff role
    pub role: EmployeeRole,
    /// Device the employee is assigned to
    pub device_id: Option<RecordId>,
}

/// Partial update for an employee
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EmployeePatch {
    /// Full name
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "must not be empty"))]
    pub name: Option<String>,
    /// Contact email
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    /// Staff role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<EmployeeRole>,
    /// Whether the employee may sign in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Device the employee is assigned to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<RecordId>,
}

impl Resource for Employee {
    type Insert = NewEmployee;
    type Patch = EmployeePatch;
    const COLLECTION: &'static str = "employees";
    const LABEL: &'static str = "Employee";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewEmployee) -> Self {
        Self {
            id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            role: payload.role,
            active: true,
            device_id: payload.device_id,
        }
    }

    fn apply_patch(&mut self, p: &EmployeePatch) {
        patch(&mut self.name, p.name.as_ref());
        patch(&mut self.email, p.email.as_ref());
        patch(&mut self.role, p.role.as_ref());
        patch(&mut self.active, p.active.as_ref());
        patch_opt(&mut self.device_id, p.device_id.as_ref());
    }
}

// ========================
// Transactions and payment methods
// ========================

/// Direction of a money movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Goods or tickets sold
    Sale,
    /// Money returned to a customer
    Refund,
    /// Credit loaded onto a wallet
    TopUp,
}

impl TransactionKind {
    /// Wire name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Refund => "refund",
            Self::TopUp => "top_up",
        }
    }
}

/// Settlement status of a transaction
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Settled
    #[default]
    Completed,
    /// Awaiting settlement
    Pending,
    /// Declined or errored
    Failed,
}

impl TransactionStatus {
    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

/// A money movement recorded by a POS device or the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: RecordId,
    /// Amount, always positive; direction comes from `kind`
    pub amount: Decimal,
    /// Direction of the movement
    pub kind: TransactionKind,
    /// Settlement status
    #[serde(default)]
    pub status: TransactionStatus,
    /// Payment method used
    #[serde(default)]
    pub payment_method_id: Option<RecordId>,
    /// Device that recorded the transaction
    #[serde(default)]
    pub device_id: Option<RecordId>,
    /// Employee that recorded the transaction
    #[serde(default)]
    pub employee_id: Option<RecordId>,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// When the transaction was recorded
    pub created_at: DateTime<Utc>,
}

/// Payload for recording a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_new_transaction_amount"))]
pub struct NewTransaction {
    /// Amount, must be positive
    pub amount: Decimal,
    /// Direction of the movement
    pub kind: TransactionKind,
    /// Payment method used
    pub payment_method_id: Option<RecordId>,
    /// Device that recorded the transaction
    pub device_id: Option<RecordId>,
    /// Employee that recorded the transaction
    pub employee_id: Option<RecordId>,
    /// Free-form description
    #[validate(length(max = 500))]
    pub description: String,
}

fn validate_new_transaction_amount(tx: &NewTransaction) -> Result<(), ValidationError> {
    if tx.amount <= Decimal::ZERO {
        let mut err = ValidationError::new("amount");
        err.message = Some("must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

/// Partial update for a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TransactionPatch {
    /// Settlement status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl Resource for Transaction {
    type Insert = NewTransaction;
    type Patch = TransactionPatch;
    const COLLECTION: &'static str = "transactions";
    const LABEL: &'static str = "Transaction";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewTransaction) -> Self {
        Self {
            id,
            amount: payload.amount,
            kind: payload.kind,
            status: TransactionStatus::Completed,
            payment_method_id: payload.payment_method_id,
            device_id: payload.device_id,
            employee_id: payload.employee_id,
            description: payload.description.clone(),
            created_at: Utc::now(),
        }
    }

    fn apply_patch(&mut self, p: &TransactionPatch) {
        patch(&mut self.status, p.status.as_ref());
        patch(&mut self.description, p.description.as_ref());
    }
}

/// Kind of payment instrument
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Credit or debit card
    Card,
    /// Cash drawer
    Cash,
    /// Prepaid venue wallet
    Wallet,
}

impl PaymentKind {
    /// Wire name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
            Self::Wallet => "wallet",
        }
    }
}

/// A stored payment instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Unique identifier
    pub id: RecordId,
    /// Display label
    pub label: String,
    /// Kind of instrument
    pub kind: PaymentKind,
    /// Last four card digits
    #[serde(default)]
    pub last_four: Option<String>,
    /// Preselected at checkout
    #[serde(default)]
    pub is_default: bool,
}

/// Payload for adding a payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewPaymentMethod {
    /// Display label
    #[validate(length(min = 1, max = 60, message = "must not be empty"))]
    pub label: String,
    /// Kind of instrument
    pub kind: PaymentKind,
    /// Last four card digits
    #[validate(length(equal = 4, message = "must be exactly 4 digits"))]
    pub last_four: Option<String>,
    /// Preselected at checkout
    pub is_default: bool,
}

/// Partial update for a payment method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PaymentMethodPatch {
    /// Display label
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 60, message = "must not be empty"))]
    pub label: Option<String>,
    /// Preselected at checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl Resource for PaymentMethod {
    type Insert = NewPaymentMethod;
    type Patch = PaymentMethodPatch;
    const COLLECTION: &'static str = "payment-methods";
    const LABEL: &'static str = "Payment method";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_insert(id: RecordId, payload: &NewPaymentMethod) -> Self {
        Self {
            id,
            label: payload.label.clone(),
            kind: payload.kind,
            last_four: payload.last_four.clone(),
            is_default: payload.is_default,
        }
    }

    fn apply_patch(&mut self, p: &PaymentMethodPatch) {
        patch(&mut self.label, p.label.as_ref());
        patch(&mut self.is_default, p.is_default.as_ref());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn new_event() -> NewEvent {
        let starts_at = Utc.with_ymd_and_hms(2026, 11, 20, 22, 0, 0).unwrap();
        NewEvent {
            name: "Warehouse Sessions".to_string(),
            description: None,
            venue: "Dock 7".to_string(),
            category: "club_night".to_string(),
            starts_at,
            ends_at: Some(starts_at + Duration::hours(6)),
            capacity: 800,
        }
    }

    #[test]
    fn test_event_deserializes_with_defaults() {
        let json = r#"{
            "id": 7,
            "name": "Techno Tuesday",
            "venue": "Basement",
            "category": "club_night",
            "starts_at": "2026-11-20T22:00:00Z",
            "capacity": 300
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.id(), 7);
        assert_eq!(event.status, EventStatus::Upcoming);
        assert_eq!(event.tickets_sold, 0);
        assert!(event.description.is_none());
    }

    #[test]
    fn test_event_rejects_missing_required_fields() {
        let json = r#"{"id": 7, "name": "No venue"}"#;
        assert!(serde_json::from_str::<Event>(json).is_err());
    }

    #[test]
    fn test_new_event_validation() {
        assert!(new_event().validate().is_ok());

        let mut empty_name = new_event();
        empty_name.name = String::new();
        assert!(empty_name.validate().is_err());

        let mut zero_capacity = new_event();
        zero_capacity.capacity = 0;
        assert!(zero_capacity.validate().is_err());

        let mut backwards = new_event();
        backwards.ends_at = Some(backwards.starts_at - Duration::hours(1));
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn test_event_from_insert_and_patch() {
        let mut event = Event::from_insert(12, &new_event());
        assert_eq!(event.id, 12);
        assert_eq!(event.tickets_sold, 0);
        assert_eq!(event.status, EventStatus::Upcoming);

        event.apply_patch(&EventPatch {
            status: Some(EventStatus::Live),
            capacity: Some(900),
            ..EventPatch::default()
        });
        assert_eq!(event.status, EventStatus::Live);
        assert_eq!(event.capacity, 900);
        assert_eq!(event.name, "Warehouse Sessions");
    }

    #[test]
    fn test_patch_serializes_only_provided_fields() {
        let patch = EventPatch {
            name: Some("Renamed".to_string()),
            ..EventPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Renamed"}));
    }

    #[rstest]
    #[case(Discount::Percentage(Decimal::new(25, 0)), Decimal::new(20, 0), Decimal::new(15, 0))]
    #[case(Discount::Fixed(Decimal::new(5, 0)), Decimal::new(20, 0), Decimal::new(15, 0))]
    #[case(Discount::Fixed(Decimal::new(50, 0)), Decimal::new(20, 0), Decimal::ZERO)]
    fn test_discount_apply(
        #[case] discount: Discount,
        #[case] price: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(discount.apply(price), expected);
    }

    #[test]
    fn test_promotion_discount_validation() {
        let promo = NewPromotion {
            code: "VIP2026".to_string(),
            description: String::new(),
            discount: Discount::Percentage(Decimal::new(150, 0)),
            event_id: None,
            max_uses: None,
        };
        assert!(promo.validate().is_err());

        let ok = NewPromotion {
            discount: Discount::Percentage(Decimal::new(10, 0)),
            ..promo
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_promotion_redeemable() {
        let mut promo = Promotion::from_insert(
            1,
            &NewPromotion {
                code: "LATE".to_string(),
                description: String::new(),
                discount: Discount::Fixed(Decimal::new(3, 0)),
                event_id: None,
                max_uses: Some(2),
            },
        );
        assert!(promo.is_redeemable());
        promo.uses = 2;
        assert!(!promo.is_redeemable());
    }

    #[test]
    fn test_employee_email_validation() {
        let hire = NewEmployee {
            name: "Sam Rivera".to_string(),
            email: "not-an-email".to_string(),
            role: EmployeeRole::Bartender,
            device_id: None,
        };
        assert!(hire.validate().is_err());
    }

    #[test]
    fn test_transaction_amount_must_be_positive() {
        let tx = NewTransaction {
            amount: Decimal::ZERO,
            kind: TransactionKind::Sale,
            payment_method_id: None,
            device_id: Some(1),
            employee_id: None,
            description: String::new(),
        };
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_enum_wire_names_match_serde() {
        assert_eq!(
            serde_json::to_value(TransactionKind::TopUp).unwrap(),
            serde_json::json!(TransactionKind::TopUp.as_str())
        );
        assert_eq!(
            serde_json::to_value(DeviceStatus::Maintenance).unwrap(),
            serde_json::json!(DeviceStatus::Maintenance.as_str())
        );
        assert_eq!(EventStatus::Past.to_string(), "past");
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!(Event::COLLECTION, "events");
        assert_eq!(TicketType::COLLECTION, "ticket-types");
        assert_eq!(PosDevice::COLLECTION, "pos-devices");
        assert_eq!(PaymentMethod::COLLECTION, "payment-methods");
    }
}
