//! Explicit dispatch table for ledger invocations.
//!
//! A ledger invocation arrives as a function name plus positional string arguments
//! (`CreatePatient PATIENT3 "Ann Lee" 41 ...`). Each `(collection, function)` pair maps to one
//! typed handler in a table that is built and checked once at startup: duplicate names or a
//! collection missing one of its core operations fail [`Dispatcher::new`] rather than surfacing
//! on the first call.
//!
//! | Operation   | Function name            | Arguments              |
//! |-------------|--------------------------|------------------------|
//! | Initialise  | `InitLedger`             | none                   |
//! | Create      | `Create<E>`              | key, then every field  |
//! | Read        | `Read<E>`                | key                    |
//! | Update      | `Update<E>`              | key, then every field  |
//! | Delete      | `Delete<E>`              | key                    |
//! | Exists      | `<E>Exists`              | key                    |
//! | ListAll     | `GetAll<E>s`             | none                   |
//! | UpdateStatus| `UpdateClaimStatus`      | key, status            |
//!
//! `<E>` is the collection's [`function_stem`](Collection::function_stem). Field arguments follow
//! the record's declaration order.

use crate::error::{LedgerError, LedgerResult};
use crate::records::{Insurance, InsuranceClaim, Patient, Record, Treatment};
use crate::registry::{Collection, CollectionRegistry};
use crate::store::LedgerStub;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// ARGUMENTS
// ============================================================================

/// Positional field arguments for one invocation, after the key.
#[derive(Clone, Copy, Debug)]
pub struct Args<'a> {
    function: &'a str,
    key: &'a str,
    params: &'static [&'static str],
    values: &'a [String],
}

impl<'a> Args<'a> {
    pub fn new(
        function: &'a str,
        key: &'a str,
        params: &'static [&'static str],
        values: &'a [String],
    ) -> Self {
        Self {
            function,
            key,
            params,
            values,
        }
    }

    pub fn key(&self) -> &'a str {
        self.key
    }

    /// The `index`th field argument as text, unchanged.
    pub fn text(&self, index: usize) -> LedgerResult<String> {
        self.raw(index).map(str::to_owned)
    }

    pub fn int(&self, index: usize) -> LedgerResult<i32> {
        let raw = self.raw(index)?;
        raw.trim()
            .parse()
            .map_err(|err: std::num::ParseIntError| self.invalid(index, err.to_string()))
    }

    pub fn float(&self, index: usize) -> LedgerResult<f64> {
        let raw = self.raw(index)?;
        raw.trim()
            .parse()
            .map_err(|err: std::num::ParseFloatError| self.invalid(index, err.to_string()))
    }

    fn raw(&self, index: usize) -> LedgerResult<&'a str> {
        self.values
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| LedgerError::ArgumentCount {
                function: self.function.to_owned(),
                expected: self.params.len() + 1,
                actual: self.values.len() + 1,
            })
    }

    fn invalid(&self, index: usize, reason: String) -> LedgerError {
        LedgerError::InvalidArgument {
            function: self.function.to_owned(),
            name: self
                .params
                .get(index)
                .copied()
                .unwrap_or("<unnamed>")
                .to_owned(),
            reason,
        }
    }
}

/// Records that can be built from positional invocation arguments.
pub trait FromArgs: Record {
    /// Wire names of the field arguments, in order. The key is not included.
    const PARAMS: &'static [&'static str];

    fn from_args(args: &Args<'_>) -> LedgerResult<Self>;
}

// ============================================================================
// OPERATIONS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    Initialise,
    Create,
    Read,
    Update,
    Delete,
    Exists,
    ListAll,
    UpdateStatus,
}

impl Operation {
    /// Operations every collection must expose.
    pub const CORE: [Operation; 7] = [
        Operation::Initialise,
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::Exists,
        Operation::ListAll,
    ];

    pub fn function_name(self, collection: Collection) -> String {
        let stem = collection.function_stem();
        match self {
            Operation::Initialise => "InitLedger".to_owned(),
            Operation::Create => format!("Create{stem}"),
            Operation::Read => format!("Read{stem}"),
            Operation::Update => format!("Update{stem}"),
            Operation::Delete => format!("Delete{stem}"),
            Operation::Exists => format!("{stem}Exists"),
            Operation::ListAll => format!("GetAll{stem}s"),
            Operation::UpdateStatus => format!("Update{stem}Status"),
        }
    }

    /// Whether the operation never writes, so its invocation need not be committed.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            Operation::Read | Operation::Exists | Operation::ListAll
        )
    }
}

// ============================================================================
// DISPATCH TABLE
// ============================================================================

/// The function name and raw arguments of one invocation.
#[derive(Clone, Copy, Debug)]
pub struct Call<'a> {
    pub function: &'a str,
    pub args: &'a [String],
}

pub type Handler<S> = fn(&CollectionRegistry, &mut S, &Call<'_>) -> LedgerResult<Value>;

/// One entry in the dispatch table.
pub struct Registration<S> {
    pub collection: Collection,
    pub operation: Operation,
    pub function: String,
    /// Argument names, key first where the operation takes one.
    pub params: Vec<&'static str>,
    pub handler: Handler<S>,
}

impl<S> Registration<S> {
    pub fn new(
        collection: Collection,
        operation: Operation,
        params: Vec<&'static str>,
        handler: Handler<S>,
    ) -> Self {
        Self {
            collection,
            operation,
            function: operation.function_name(collection),
            params,
            handler,
        }
    }
}

impl<S> std::fmt::Debug for Registration<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("collection", &self.collection)
            .field("operation", &self.operation)
            .field("function", &self.function)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Public description of a dispatchable function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub collection: String,
    pub function: String,
    pub operation: Operation,
    pub params: Vec<&'static str>,
    pub read_only: bool,
}

/// Validated `(collection, function) -> handler` table.
pub struct Dispatcher<S> {
    registrations: Vec<Registration<S>>,
    index: HashMap<(Collection, String), usize>,
}

impl<S: LedgerStub> Dispatcher<S> {
    /// Builds the table for all four collections.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::DispatchTable` if the table is inconsistent.
    pub fn new() -> LedgerResult<Self> {
        let mut registrations = Vec::new();
        register_collection::<Patient, S>(&mut registrations);
        register_collection::<Treatment, S>(&mut registrations);
        register_collection::<Insurance, S>(&mut registrations);
        register_collection::<InsuranceClaim, S>(&mut registrations);
        registrations.push(Registration::new(
            Collection::InsuranceClaim,
            Operation::UpdateStatus,
            vec!["id", "status"],
            update_claim_status_handler::<S>,
        ));

        Self::from_registrations(registrations)
    }

    /// Validates an explicit list of registrations.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::DispatchTable` if a `(collection, function)` pair is registered
    /// twice or a collection lacks one of [`Operation::CORE`].
    pub fn from_registrations(registrations: Vec<Registration<S>>) -> LedgerResult<Self> {
        let mut index = HashMap::with_capacity(registrations.len());
        for (position, registration) in registrations.iter().enumerate() {
            let slot = (registration.collection, registration.function.clone());
            if index.insert(slot, position).is_some() {
                return Err(LedgerError::DispatchTable(format!(
                    "{} is registered twice for {}",
                    registration.function, registration.collection
                )));
            }
        }

        for collection in Collection::ALL {
            for operation in Operation::CORE {
                let present = registrations
                    .iter()
                    .any(|r| r.collection == collection && r.operation == operation);
                if !present {
                    return Err(LedgerError::DispatchTable(format!(
                        "{collection} has no {operation:?} handler"
                    )));
                }
            }
        }

        tracing::debug!(functions = registrations.len(), "dispatch table validated");
        Ok(Self {
            registrations,
            index,
        })
    }

    /// Every dispatchable function, in registration order.
    pub fn functions(&self) -> Vec<FunctionInfo> {
        self.registrations
            .iter()
            .map(|r| FunctionInfo {
                collection: r.collection.display_name().to_owned(),
                function: r.function.clone(),
                operation: r.operation,
                params: r.params.clone(),
                read_only: r.operation.is_read_only(),
            })
            .collect()
    }

    /// Looks up the registration for `function` on `collection`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownFunction` if there is none.
    pub fn resolve(&self, collection: Collection, function: &str) -> LedgerResult<&Registration<S>> {
        self.index
            .get(&(collection, function.to_owned()))
            .map(|&position| &self.registrations[position])
            .ok_or_else(|| LedgerError::UnknownFunction {
                collection,
                function: function.to_owned(),
            })
    }

    /// Runs `function` on `collection` with positional `args` against `stub`.
    ///
    /// # Errors
    ///
    /// - `LedgerError::UnknownFunction` if the function is not in the table.
    /// - `LedgerError::ArgumentCount` if `args` has the wrong length.
    /// - Whatever the handler returns.
    pub fn invoke(
        &self,
        registry: &CollectionRegistry,
        stub: &mut S,
        collection: Collection,
        function: &str,
        args: &[String],
    ) -> LedgerResult<Value> {
        let registration = self.resolve(collection, function)?;
        if args.len() != registration.params.len() {
            return Err(LedgerError::ArgumentCount {
                function: registration.function.clone(),
                expected: registration.params.len(),
                actual: args.len(),
            });
        }

        tracing::debug!(
            tx_id = stub.tx_id(),
            %collection,
            function = %registration.function,
            "dispatching invocation"
        );
        (registration.handler)(
            registry,
            stub,
            &Call {
                function: &registration.function,
                args,
            },
        )
    }
}

impl<S> std::fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registrations", &self.registrations)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

fn register_collection<R: FromArgs, S: LedgerStub>(registrations: &mut Vec<Registration<S>>) {
    let collection = R::COLLECTION;
    let mut record_params = vec!["id"];
    record_params.extend_from_slice(R::PARAMS);

    registrations.extend([
        Registration::new(
            collection,
            Operation::Initialise,
            Vec::new(),
            initialise_handler::<R, S>,
        ),
        Registration::new(
            collection,
            Operation::Create,
            record_params.clone(),
            create_handler::<R, S>,
        ),
        Registration::new(collection, Operation::Read, vec!["id"], read_handler::<R, S>),
        Registration::new(
            collection,
            Operation::Update,
            record_params,
            update_handler::<R, S>,
        ),
        Registration::new(
            collection,
            Operation::Delete,
            vec!["id"],
            delete_handler::<R, S>,
        ),
        Registration::new(
            collection,
            Operation::Exists,
            vec!["id"],
            exists_handler::<R, S>,
        ),
        Registration::new(
            collection,
            Operation::ListAll,
            Vec::new(),
            list_all_handler::<R, S>,
        ),
    ]);
}

fn to_json<R: Record, T: Serialize>(value: &T) -> LedgerResult<Value> {
    serde_json::to_value(value).map_err(|source| LedgerError::Encode {
        collection: R::COLLECTION,
        source,
    })
}

/// Splits `args` into the key and the field arguments that follow it.
fn record_args<'a, R: FromArgs>(call: &Call<'a>) -> LedgerResult<Args<'a>> {
    let (key, values) = call
        .args
        .split_first()
        .ok_or_else(|| LedgerError::ArgumentCount {
            function: call.function.to_owned(),
            expected: R::PARAMS.len() + 1,
            actual: 0,
        })?;
    Ok(Args::new(call.function, key, R::PARAMS, values))
}

fn key_arg<'a>(call: &Call<'a>) -> LedgerResult<&'a str> {
    call.args
        .first()
        .map(String::as_str)
        .ok_or_else(|| LedgerError::ArgumentCount {
            function: call.function.to_owned(),
            expected: 1,
            actual: 0,
        })
}

fn initialise_handler<R: FromArgs, S: LedgerStub>(
    registry: &CollectionRegistry,
    stub: &mut S,
    _call: &Call<'_>,
) -> LedgerResult<Value> {
    let seeded = registry.service::<R>().initialise(stub)?;
    let keys: Vec<String> = seeded.into_iter().map(|entry| entry.key).collect();
    to_json::<R, _>(&keys)
}

fn create_handler<R: FromArgs, S: LedgerStub>(
    registry: &CollectionRegistry,
    stub: &mut S,
    call: &Call<'_>,
) -> LedgerResult<Value> {
    let args = record_args::<R>(call)?;
    let record = R::from_args(&args)?;
    let record = registry.service::<R>().create(stub, args.key(), record)?;
    to_json::<R, _>(&record)
}

fn read_handler<R: FromArgs, S: LedgerStub>(
    registry: &CollectionRegistry,
    stub: &mut S,
    call: &Call<'_>,
) -> LedgerResult<Value> {
    let record = registry.service::<R>().read(stub, key_arg(call)?)?;
    to_json::<R, _>(&record)
}

fn update_handler<R: FromArgs, S: LedgerStub>(
    registry: &CollectionRegistry,
    stub: &mut S,
    call: &Call<'_>,
) -> LedgerResult<Value> {
    let args = record_args::<R>(call)?;
    let record = R::from_args(&args)?;
    let record = registry.service::<R>().update(stub, args.key(), record)?;
    to_json::<R, _>(&record)
}

fn delete_handler<R: FromArgs, S: LedgerStub>(
    registry: &CollectionRegistry,
    stub: &mut S,
    call: &Call<'_>,
) -> LedgerResult<Value> {
    registry.service::<R>().delete(stub, key_arg(call)?)?;
    Ok(Value::Null)
}

fn exists_handler<R: FromArgs, S: LedgerStub>(
    registry: &CollectionRegistry,
    stub: &mut S,
    call: &Call<'_>,
) -> LedgerResult<Value> {
    let exists = registry.service::<R>().exists(stub, key_arg(call)?)?;
    Ok(Value::Bool(exists))
}

fn list_all_handler<R: FromArgs, S: LedgerStub>(
    registry: &CollectionRegistry,
    stub: &mut S,
    _call: &Call<'_>,
) -> LedgerResult<Value> {
    let records = registry.service::<R>().list_all(stub)?;
    to_json::<R, _>(&records)
}

fn update_claim_status_handler<S: LedgerStub>(
    registry: &CollectionRegistry,
    stub: &mut S,
    call: &Call<'_>,
) -> LedgerResult<Value> {
    let (key, status) = match call.args {
        [key, status] => (key.as_str(), status.as_str()),
        _ => {
            return Err(LedgerError::ArgumentCount {
                function: call.function.to_owned(),
                expected: 2,
                actual: call.args.len(),
            })
        }
    };
    let claim = registry
        .service::<InsuranceClaim>()
        .update_status(stub, key, status)?;
    to_json::<InsuranceClaim, _>(&claim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::error::ErrorKind;
    use crate::ledger::{InMemoryLedger, Transaction};
    use crate::validation::ReferenceValidation;
    use std::sync::Arc;

    fn registry() -> CollectionRegistry {
        let cfg = CoreConfig::new("medledger.test", ReferenceValidation::Disabled).unwrap();
        CollectionRegistry::new(Arc::new(cfg))
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    fn invoke(
        ledger: &InMemoryLedger,
        dispatcher: &Dispatcher<Transaction>,
        collection: Collection,
        function: &str,
        values: &[&str],
    ) -> LedgerResult<Value> {
        let registry = registry();
        ledger
            .submit(collection.namespace(), |tx| {
                dispatcher.invoke(&registry, tx, collection, function, &args(values))
            })
            .map(|submitted| submitted.value)
    }

    #[test]
    fn test_table_covers_every_collection() {
        let dispatcher = Dispatcher::<Transaction>::new().unwrap();
        let functions = dispatcher.functions();
        assert_eq!(functions.len(), Collection::ALL.len() * Operation::CORE.len() + 1);

        let names: Vec<&str> = functions.iter().map(|f| f.function.as_str()).collect();
        for expected in [
            "CreatePatient",
            "ReadTreatment",
            "InsuranceExists",
            "GetAllClaims",
            "DeleteClaim",
            "UpdateClaimStatus",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }

        let create_patient = dispatcher
            .resolve(Collection::Patient, "CreatePatient")
            .unwrap();
        assert_eq!(create_patient.params.len(), 14);
        assert_eq!(create_patient.params[0], "id");
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registrations = Vec::new();
        register_collection::<Patient, Transaction>(&mut registrations);
        register_collection::<Treatment, Transaction>(&mut registrations);
        register_collection::<Insurance, Transaction>(&mut registrations);
        register_collection::<InsuranceClaim, Transaction>(&mut registrations);
        registrations.push(Registration::new(
            Collection::Patient,
            Operation::Read,
            vec!["id"],
            read_handler::<Patient, Transaction>,
        ));

        let err = Dispatcher::from_registrations(registrations).unwrap_err();
        assert!(matches!(err, LedgerError::DispatchTable(_)));
    }

    #[test]
    fn test_missing_core_operation_is_rejected() {
        let mut registrations = Vec::new();
        register_collection::<Patient, Transaction>(&mut registrations);
        register_collection::<Treatment, Transaction>(&mut registrations);
        register_collection::<Insurance, Transaction>(&mut registrations);

        let err = Dispatcher::from_registrations(registrations).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("claim"));
    }

    #[test]
    fn test_create_and_read_claim_through_table() {
        let ledger = InMemoryLedger::new();
        let dispatcher = Dispatcher::new().unwrap();
        let claims = Collection::InsuranceClaim;

        let created = invoke(
            &ledger,
            &dispatcher,
            claims,
            "CreateClaim",
            &["CLAIM1", "TREATMENT1", "PATIENT1", "123456789012", "INS123456", "Pending"],
        )
        .unwrap();
        assert_eq!(created["claimID"], "CLAIM1");

        let read = invoke(&ledger, &dispatcher, claims, "ReadClaim", &["CLAIM1"]).unwrap();
        assert_eq!(read, created);
        assert_eq!(read["status"], "Pending");

        invoke(&ledger, &dispatcher, claims, "DeleteClaim", &["CLAIM1"]).unwrap();
        let exists = invoke(&ledger, &dispatcher, claims, "ClaimExists", &["CLAIM1"]).unwrap();
        assert_eq!(exists, Value::Bool(false));
        let err = invoke(&ledger, &dispatcher, claims, "DeleteClaim", &["CLAIM1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_numeric_arguments_are_parsed() {
        let ledger = InMemoryLedger::new();
        let dispatcher = Dispatcher::new().unwrap();

        let created = invoke(
            &ledger,
            &dispatcher,
            Collection::Treatment,
            "CreateTreatment",
            &[
                "TREATMENT3",
                "Asthma",
                "City Hospital",
                "7",
                "Outpatient",
                "Salbutamol",
                "PATIENT1",
                "2024-01-02",
                "2024-01-02",
                "80.25",
                "Dr. Rao",
            ],
        )
        .unwrap();
        assert_eq!(created["billingAmount"], 80.25);

        let err = invoke(
            &ledger,
            &dispatcher,
            Collection::Insurance,
            "CreateInsurance",
            &[
                "INS1",
                "Ann Lee",
                "111122223333",
                "2024-01-01",
                "2025-01-01",
                "forty",
                "1000",
                "0",
            ],
        )
        .unwrap_err();
        match err {
            LedgerError::InvalidArgument { name, .. } => assert_eq!(name, "age"),
            other => panic!("expected invalid argument, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_arity_and_unknown_function() {
        let ledger = InMemoryLedger::new();
        let dispatcher = Dispatcher::new().unwrap();

        let err = invoke(
            &ledger,
            &dispatcher,
            Collection::Patient,
            "ReadPatient",
            &["PATIENT1", "extra"],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ArgumentCount {
                expected: 1,
                actual: 2,
                ..
            }
        ));

        let err = invoke(&ledger, &dispatcher, Collection::Patient, "ReadClaim", &["CLAIM1"])
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownFunction { .. }));
    }

    #[test]
    fn test_init_ledger_then_list_and_update_status() {
        let ledger = InMemoryLedger::new();
        let dispatcher = Dispatcher::new().unwrap();
        let claims = Collection::InsuranceClaim;

        let seeded = invoke(&ledger, &dispatcher, claims, "InitLedger", &[]).unwrap();
        assert_eq!(seeded, serde_json::json!(["CLAIM1", "CLAIM2"]));

        let updated = invoke(
            &ledger,
            &dispatcher,
            claims,
            "UpdateClaimStatus",
            &["CLAIM1", "Rejected"],
        )
        .unwrap();
        assert_eq!(updated["status"], "Rejected");

        let all = invoke(&ledger, &dispatcher, claims, "GetAllClaims", &[]).unwrap();
        let statuses: Vec<&str> = all
            .as_array()
            .unwrap()
            .iter()
            .map(|claim| claim["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses, ["Rejected", "Approved"]);
    }

    #[test]
    fn test_read_only_operations() {
        assert!(Operation::Read.is_read_only());
        assert!(Operation::ListAll.is_read_only());
        assert!(!Operation::Initialise.is_read_only());
        assert!(!Operation::UpdateStatus.is_read_only());
        assert_eq!(
            Operation::UpdateStatus.function_name(Collection::InsuranceClaim),
            "UpdateClaimStatus"
        );
    }
}
