//! Database entity models for vetbase-db.
//!
//! These models represent the database tables and provide
//! type-safe interactions with PostgreSQL.

pub mod animal;
pub mod appointment;
pub mod attendance;
pub mod collaborator;
pub mod invoice;
pub mod invoice_installment;
pub mod invoice_item;
pub mod invoice_status;
pub mod product;
pub mod service_definition;
pub mod tutor;

pub use animal::{Animal, CreateAnimal};
pub use appointment::{Appointment, AppointmentStatus, CreateAppointment};
pub use attendance::{
    Attendance, AttendanceCatalogItem, AttendanceKind, AttendanceProductItem, CreateAttendance,
    NewCatalogItem, NewProductItem,
};
pub use collaborator::{Collaborator, CollaboratorRole, CreateCollaborator};
pub use invoice::{CreateInvoice, Invoice};
pub use invoice_installment::{InvoiceInstallment, NewInstallment};
pub use invoice_item::{InvoiceItem, NewInvoiceItem};
pub use invoice_status::InvoiceStatus;
pub use product::{CreateProduct, Product};
pub use service_definition::{CreateServiceDefinition, ServiceDefinition};
