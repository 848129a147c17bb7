use crate::accounting::AccountingClient;
use crate::config::AccountingConfig;
use crate::documents::{digits_only, normalize_document};
use crate::error::ReconcileResult;
use crate::models::{
    Buyer, BuyerAddress, CustomerAddress, NewCustomer, NewService, PersonType, Product, Purchase,
};

/// Digits in a home-country postal code (CEP).
pub const POSTAL_CODE_DIGITS: usize = 8;
/// Longest phone number the accounting system accepts, in digits.
pub const MAX_PHONE_DIGITS: usize = 11;

/// Find-or-create for customers and services.
///
/// Search then create is not atomic and a failed search falls through to
/// creation, so concurrent or repeated deliveries for the same buyer or
/// product can still produce duplicates upstream.
#[derive(Debug, Clone)]
pub struct EntityResolver {
    client: AccountingClient,
    config: AccountingConfig,
}

impl EntityResolver {
    pub fn new(client: AccountingClient, config: AccountingConfig) -> Self {
        Self { client, config }
    }

    pub async fn resolve_customer(&self, buyer: &Buyer, token: &str) -> ReconcileResult<String> {
        let document = buyer
            .document
            .as_deref()
            .map(digits_only)
            .filter(|d| !d.is_empty());

        if let Some(document) = &document {
            match self.client.find_customer_by_document(document, token).await {
                Ok(found) => {
                    if let Some(customer) = found.into_iter().next() {
                        tracing::debug!(customer_id = %customer.id, "Customer matched by document");
                        return Ok(customer.id);
                    }
                }
                Err(e) => tracing::warn!("Customer search by document failed: {}", e),
            }
        }

        if !buyer.email.trim().is_empty() {
            match self.client.find_customer_by_text(buyer.email.trim(), token).await {
                Ok(found) => {
                    if let Some(customer) = found.into_iter().next() {
                        tracing::debug!(customer_id = %customer.id, "Customer matched by email");
                        return Ok(customer.id);
                    }
                }
                Err(e) => tracing::warn!("Customer search by email failed: {}", e),
            }
        }

        let new_customer = self.new_customer(buyer);
        let created = self.client.create_customer(&new_customer, token).await?;
        tracing::info!(
            customer_id = %created.id,
            person_type = new_customer.person_type.as_str(),
            "Created customer"
        );
        Ok(created.id)
    }

    pub async fn resolve_service(
        &self,
        product: &Product,
        purchase: &Purchase,
        token: &str,
    ) -> ReconcileResult<String> {
        match self.client.find_service_by_code(&product.id, token).await {
            Ok(found) => {
                if let Some(service) = found.into_iter().next() {
                    tracing::debug!(service_id = %service.id, code = %product.id, "Service matched by code");
                    return Ok(service.id);
                }
            }
            Err(e) => tracing::warn!(code = %product.id, "Service search by code failed: {}", e),
        }

        let new_service = NewService::provided(&product.id, &product.name, purchase.list_price());
        let created = self.client.create_service(&new_service, token).await?;
        tracing::info!(service_id = %created.id, code = %product.id, "Created service");
        Ok(created.id)
    }

    /// Customer payload for a buyer that matched nothing upstream.
    pub fn new_customer(&self, buyer: &Buyer) -> NewCustomer {
        let (document, generated) = normalize_document(buyer.document.as_deref());
        if generated {
            tracing::info!("Buyer has no valid CPF/CNPJ, using a generated placeholder");
        }
        let person_type = PersonType::from_document(&document).unwrap_or(PersonType::Natural);

        NewCustomer {
            name: buyer.name.clone(),
            email: buyer.email.clone(),
            document,
            person_type,
            business_phone: buyer.checkout_phone.as_deref().and_then(normalize_phone),
            address: self.normalize_address(buyer.address.as_ref()),
        }
    }

    /// Foreign or missing addresses become the default address; a home
    /// address keeps its fields, each falling back to the default when absent,
    /// and a malformed postal code is replaced by the default one.
    pub fn normalize_address(&self, address: Option<&BuyerAddress>) -> CustomerAddress {
        let default = &self.config.default_address;

        let Some(address) = address else {
            tracing::info!("Buyer has no address, using default address");
            return CustomerAddress::from(default);
        };
        if !self.is_home_country(address) {
            tracing::info!("Buyer address is outside the home country, using default address");
            return CustomerAddress::from(default);
        }

        let zip_code = match address.zipcode.as_deref().map(digits_only) {
            Some(zip) if zip.len() == POSTAL_CODE_DIGITS => zip,
            _ => {
                tracing::info!("Buyer postal code is missing or malformed, using default");
                default.zip_code.clone()
            }
        };

        let pick = |value: &Option<String>, fallback: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };

        CustomerAddress {
            zip_code,
            street: pick(&address.address, &default.street),
            number: pick(&address.number, &default.number),
            complement: pick(&address.complement, ""),
            neighborhood: pick(&address.neighborhood, &default.neighborhood),
            city: pick(&address.city, &default.city),
            state: pick(&address.state, &default.state),
        }
    }

    /// Addresses that do not say where they are count as home addresses.
    fn is_home_country(&self, address: &BuyerAddress) -> bool {
        let country = address
            .country_iso
            .as_deref()
            .or(address.country.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty());
        match country {
            None => true,
            Some(country) => self
                .config
                .home_country_aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(country)),
        }
    }
}

/// Digits only, keeping the last `MAX_PHONE_DIGITS` (drops country codes).
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.is_empty() {
        return None;
    }
    let skip = digits.len().saturating_sub(MAX_PHONE_DIGITS);
    Some(digits[skip..].to_string())
}
