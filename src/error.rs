//! Error types for validation, spreadsheet, dashboard and auth failures.

use crate::models::CidrError;
use crate::sheet::Column;
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Where in a row a validation problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The row as a whole (incomplete rows, duplicates).
    Row,
    Column(Column),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Row => write!(f, "Row"),
            Field::Column(c) => write!(f, "{c}"),
        }
    }
}

/// The rule a field value violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    #[error("value is empty")]
    Empty,
    #[error("'{0}' contains invalid characters (allowed: letters, digits, space, . @ # _ -)")]
    InvalidCharacters(String),
    #[error("'{0}' is not a valid integer")]
    NotAnInteger(String),
    #[error("VLAN ID {0} must be between 1-4094")]
    VlanIdOutOfRange(i64),
    #[error("not valid CIDR notation: {0}")]
    InvalidSubnet(CidrError),
    #[error("'{0}' is not a valid IP address")]
    InvalidIp(String),
    #[error("'{0}' is an IPv6 address but the subnet is IPv4")]
    AddressFamily(String),
    #[error("{ip} does not belong to subnet {subnet}")]
    OutsideSubnet { ip: Ipv4Addr, subnet: String },
    #[error("{ip} is the network address of {subnet}")]
    NetworkAddress { ip: Ipv4Addr, subnet: String },
    #[error("{ip} is the broadcast address of {subnet}")]
    BroadcastAddress { ip: Ipv4Addr, subnet: String },
    #[error("incomplete row, empty: {0}")]
    IncompleteRow(String),
    #[error("duplicate VLAN ID {vlan_id} for network '{network}', first defined on row {first_row}")]
    DuplicateVlan {
        network: String,
        vlan_id: u16,
        first_row: usize,
    },
}

/// A rule violation on one field of one spreadsheet row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Row {row}: {field}: {kind}")]
pub struct ValidationError {
    /// Spreadsheet row number, the header being row 1.
    pub row: usize,
    pub field: Field,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(row: usize, column: Column, kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            row,
            field: Field::Column(column),
            kind,
        }
    }

    pub fn row(row: usize, kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            row,
            field: Field::Row,
            kind,
        }
    }
}

/// The spreadsheet does not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("spreadsheet has no header row")]
    NoHeader,
}

/// Reading or writing the spreadsheet file failed.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("unsupported spreadsheet format '{0}', use .xlsx or .csv")]
    UnsupportedFormat(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("workbook {0} has no worksheet")]
    NoWorksheet(String),
    #[error("Error reading Excel file: {0}")]
    Excel(#[from] calamine::Error),
    #[error("Error writing Excel file: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A dashboard API call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// HTTP status, `None` for transport or decode failures.
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> RemoteError {
        RemoteError {
            status,
            message: message.into(),
        }
    }

    /// Rate limiting and server side failures are worth another try.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status, Some(429) | Some(500..=599))
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => write!(f, "request failed: {}", self.message),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::new(e.status().map(|s| s.as_u16()), e.to_string())
    }
}

/// Credentials are missing or were refused.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("MERAKI_API_KEY not found in environment variables or .env file")]
    MissingApiKey,
    #[error("MERAKI_CLIENT_ID and MERAKI_CLIENT_SECRET must be set for OAuth")]
    MissingOAuthClient,
    #[error("No authorization code provided")]
    NoAuthorizationCode,
    #[error("OAuth token exchange failed: {0}")]
    TokenExchange(String),
    #[error("invalid API credentials: {0}")]
    Rejected(RemoteError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top level error of a command.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("{0} validation error(s)")]
    Validation(usize),
    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] SheetError),
    #[error("Dashboard error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("organization '{0}' is not accessible with these credentials")]
    UnknownOrganization(String),
    #[error("--org <ID> (or MERAKI_ORG_ID) is required for this command")]
    MissingOrganization,
    #[error("No VLAN data found in any networks")]
    NoData,
    #[error("{0} operation(s) failed")]
    Apply(usize),
}
