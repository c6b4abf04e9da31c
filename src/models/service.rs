use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub price: f64,
}

/// A requested quantity of one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub service_id: String,
    pub quantity: u32,
}

impl ServiceSelection {
    /// Parses `id:qty,id:qty`. A bare `id` means quantity 1.
    pub fn parse_list(s: &str) -> Result<Vec<ServiceSelection>, String> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once(':') {
                Some((id, qty)) => {
                    let quantity = qty
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| format!("invalid quantity in: {part}"))?;
                    Ok(ServiceSelection {
                        service_id: id.trim().to_string(),
                        quantity,
                    })
                }
                None => Ok(ServiceSelection {
                    service_id: part.to_string(),
                    quantity: 1,
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let parsed = ServiceSelection::parse_list("cut:2, beard:1,shave").unwrap();
        assert_eq!(
            parsed,
            vec![
                ServiceSelection { service_id: "cut".into(), quantity: 2 },
                ServiceSelection { service_id: "beard".into(), quantity: 1 },
                ServiceSelection { service_id: "shave".into(), quantity: 1 },
            ]
        );
    }

    #[test]
    fn test_parse_list_bad_quantity() {
        assert!(ServiceSelection::parse_list("cut:-1").is_err());
        assert!(ServiceSelection::parse_list("cut:two").is_err());
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(ServiceSelection::parse_list("").unwrap().is_empty());
    }
}
