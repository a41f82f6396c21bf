use serde::{Deserialize, Serialize};

use ecommerce_core::{Aggregate, DomainError, DomainResult};
use ecommerce_events::{DomainCommand, DomainEvent};

pub const CUSTOMER_CATEGORY: &str = "Crm::Customer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command_type", content = "params")]
pub enum CustomerCommand {
    RegisterCustomer { customer_id: String, name: String },
    RenameCustomer { customer_id: String, name: String },
}

impl DomainCommand for CustomerCommand {
    const COMMAND_TYPES: &'static [&'static str] = &["RegisterCustomer", "RenameCustomer"];

    fn target_id(&self) -> &str {
        match self {
            CustomerCommand::RegisterCustomer { customer_id, .. }
            | CustomerCommand::RenameCustomer { customer_id, .. } => customer_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum CustomerEvent {
    CustomerRegistered { customer_id: String, name: String },
    CustomerRenamed { customer_id: String, name: String },
}

impl DomainEvent for CustomerEvent {
    const EVENT_TYPES: &'static [&'static str] = &["CustomerRegistered", "CustomerRenamed"];

    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerRegistered { .. } => "CustomerRegistered",
            CustomerEvent::CustomerRenamed { .. } => "CustomerRenamed",
        }
    }
}

/// Aggregate root: Customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: String,
    name: Option<String>,
}

impl Customer {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_registered(&self) -> bool {
        self.name.is_some()
    }
}

impl Aggregate for Customer {
    type Command = CustomerCommand;
    type Event = CustomerEvent;

    fn apply(&mut self, event: &CustomerEvent) {
        match event {
            CustomerEvent::CustomerRegistered { name, .. } | CustomerEvent::CustomerRenamed { name, .. } => {
                self.name = Some(name.clone());
            }
        }
    }

    fn handle(&self, command: &CustomerCommand) -> DomainResult<Vec<CustomerEvent>> {
        match command {
            CustomerCommand::RegisterCustomer { name, .. } => {
                if self.is_registered() {
                    return Err(DomainError::conflict(format!("customer {} already registered", self.id)));
                }
                let name = Self::validated_name(name)?;
                Ok(vec![CustomerEvent::CustomerRegistered {
                    customer_id: self.id.clone(),
                    name,
                }])
            }
            CustomerCommand::RenameCustomer { name, .. } => {
                if !self.is_registered() {
                    return Err(DomainError::not_found(format!("customer {}", self.id)));
                }
                let name = Self::validated_name(name)?;
                if self.name.as_deref() == Some(name.as_str()) {
                    return Ok(vec![]);
                }
                Ok(vec![CustomerEvent::CustomerRenamed {
                    customer_id: self.id.clone(),
                    name,
                }])
            }
        }
    }
}

impl Customer {
    fn validated_name(name: &str) -> DomainResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str) -> CustomerCommand {
        CustomerCommand::RegisterCustomer {
            customer_id: "C1".to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn registration_happens_once() {
        let mut c = Customer::new("C1");
        for e in c.handle(&register("  Ada ")).unwrap() {
            c.apply(&e);
        }
        assert_eq!(c.name(), Some("Ada"));
        assert!(matches!(c.handle(&register("Ada")), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(matches!(
            Customer::new("C1").handle(&register(" ")),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn unknown_customer_cannot_be_renamed() {
        let cmd = CustomerCommand::RenameCustomer {
            customer_id: "C1".to_string(),
            name: "Grace".to_string(),
        };
        assert!(matches!(Customer::new("C1").handle(&cmd), Err(DomainError::NotFound(_))));
    }
}
