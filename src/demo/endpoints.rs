//! Demo endpoints

use std::sync::Arc;

use hyper::body::Bytes;
use hyper::Request;

use super::people::{Collection, PeopleStore, Person};
use crate::endpoint::{Created, Deleter, Endpoint, Getter, MaybeResource, Poster, Preflighter};
use crate::error::RestError;
use crate::http::body::{json_body, require_content_type};
use crate::http::cors::{AccessControlRequest, AccessControlResponse};
use crate::http::mime::{APPLICATION_JSON, TEXT_PLAIN};
use crate::resource::Resource;
use crate::routing::RouteVars;

/// Origin granted to preflights on `/echo`
pub const ECHO_ORIGIN: &str = "preflighted.domain.com";

/// Request body handed back verbatim
struct EchoBody(Bytes);

impl Resource for EchoBody {
    fn media_types(&self) -> &[&str] {
        &[TEXT_PLAIN]
    }

    fn marshal(&self, _: &str, _: &Request<Bytes>) -> Result<Bytes, RestError> {
        Ok(self.0.clone())
    }
}

/// `/echo`: POST returns the request body as text
pub struct EchoEndpoint;

impl Poster for EchoEndpoint {
    fn post(&self, _: &RouteVars, req: &Request<Bytes>) -> Result<Created, RestError> {
        Ok(Created::new(EchoBody(req.body().clone())))
    }
}

impl Preflighter for EchoEndpoint {
    fn preflight(&self, _: &AccessControlRequest, _: &Request<Bytes>) -> AccessControlResponse {
        AccessControlResponse::for_origin(ECHO_ORIGIN)
    }
}

impl Endpoint for EchoEndpoint {
    fn poster(&self) -> Option<&dyn Poster> {
        Some(self)
    }

    fn preflighter(&self) -> Option<&dyn Preflighter> {
        Some(self)
    }
}

/// `/people`: the collection, and creation
pub struct PeopleEndpoint {
    store: Arc<PeopleStore>,
}

impl PeopleEndpoint {
    pub const fn new(store: Arc<PeopleStore>) -> Self {
        Self { store }
    }
}

impl Getter for PeopleEndpoint {
    fn get(&self, _: &RouteVars, _: &Request<Bytes>) -> MaybeResource {
        let people = self.store.all()?;
        if people.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(Collection::new(people))))
    }
}

impl Poster for PeopleEndpoint {
    /// An empty body answers with the first stored person, as if just created
    fn post(&self, _: &RouteVars, req: &Request<Bytes>) -> Result<Created, RestError> {
        require_content_type(req, &[APPLICATION_JSON])?;

        let person = if req.body().is_empty() {
            self.store.first()?.ok_or(RestError::NotFound)?
        } else {
            let person: Person = json_body(req)?;
            self.store.insert(person.clone())?;
            tracing::debug!(id = %person.id, "person created");
            person
        };
        let location = format!("/people/{}", person.id);
        Ok(Created::new(person).at(location))
    }
}

impl Endpoint for PeopleEndpoint {
    fn getter(&self) -> Option<&dyn Getter> {
        Some(self)
    }

    fn poster(&self) -> Option<&dyn Poster> {
        Some(self)
    }
}

/// `/people/{id}`
pub struct PersonEndpoint {
    store: Arc<PeopleStore>,
}

impl PersonEndpoint {
    pub const fn new(store: Arc<PeopleStore>) -> Self {
        Self { store }
    }
}

impl Getter for PersonEndpoint {
    fn get(&self, vars: &RouteVars, _: &Request<Bytes>) -> MaybeResource {
        let id = vars.get("id").unwrap_or_default();
        Ok(self
            .store
            .find(id)?
            .map(|p| Box::new(p) as Box<dyn Resource>))
    }
}

impl Deleter for PersonEndpoint {
    fn delete(&self, vars: &RouteVars, _: &Request<Bytes>) -> Result<(), RestError> {
        let id = vars.get("id").unwrap_or_default();
        if self.store.remove(id)? {
            tracing::debug!(id, "person deleted");
            Ok(())
        } else {
            Err(RestError::NotFound)
        }
    }
}

impl Endpoint for PersonEndpoint {
    fn getter(&self) -> Option<&dyn Getter> {
        Some(self)
    }

    fn deleter(&self) -> Option<&dyn Deleter> {
        Some(self)
    }
}

/// `/employers`: distinct employers of the stored people
pub struct EmployersEndpoint {
    store: Arc<PeopleStore>,
}

impl EmployersEndpoint {
    pub const fn new(store: Arc<PeopleStore>) -> Self {
        Self { store }
    }
}

impl Getter for EmployersEndpoint {
    fn get(&self, _: &RouteVars, _: &Request<Bytes>) -> MaybeResource {
        let employers = self.store.employers()?;
        if employers.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(Collection::new(employers))))
    }
}

impl Endpoint for EmployersEndpoint {
    fn getter(&self) -> Option<&dyn Getter> {
        Some(self)
    }
}

/// `/employers/{name}`, matched case-insensitively
pub struct EmployerEndpoint {
    store: Arc<PeopleStore>,
}

impl EmployerEndpoint {
    pub const fn new(store: Arc<PeopleStore>) -> Self {
        Self { store }
    }
}

impl Getter for EmployerEndpoint {
    fn get(&self, vars: &RouteVars, _: &Request<Bytes>) -> MaybeResource {
        let name = vars.get("name").unwrap_or_default();
        Ok(self
            .store
            .employer(name)?
            .map(|e| Box::new(e) as Box<dyn Resource>))
    }
}

impl Endpoint for EmployerEndpoint {
    fn getter(&self) -> Option<&dyn Getter> {
        Some(self)
    }
}
