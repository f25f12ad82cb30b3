use std::task::{Context, Poll};

use crate::{
    domain::{
        validation::{
            require_email, require_non_negative, require_positive, require_text, ValidationError,
        },
        Customer, NewCustomer,
    },
    ports::database::{DatabasePort, Entity},
};
use tower::Service;
use tracing::{debug, info};

use super::{CommandFuture, DomainLogic, Error};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateCustomerRequest {
    pub full_name: String,
    pub email: String,
    /// Opening balance
    pub points: i64,
}

impl CreateCustomerRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("fullName", &self.full_name)?;
        require_email("email", &self.email)?;
        require_non_negative("points", self.points)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListCustomersRequest;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerDetailRequest {
    pub customer_id: i64,
}

/// Overwrite the point balance of a customer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateCustomerPointsRequest {
    pub customer_id: i64,
    pub points: i64,
}

impl<D> Service<CreateCustomerRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Customer;
    type Error = Error;
    type Future = CommandFuture<Customer>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CreateCustomerRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            req.validate()?;
            let customer = database
                .create_customer(NewCustomer {
                    full_name: req.full_name,
                    email: req.email,
                    points: req.points,
                })
                .await?;
            info!(customer_id = customer.id, "customer created");

            Ok(customer)
        })
    }
}

impl<D> Service<ListCustomersRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Vec<Customer>;
    type Error = Error;
    type Future = CommandFuture<Vec<Customer>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: ListCustomersRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move { Ok(database.list_customers().await?) })
    }
}

impl<D> Service<CustomerDetailRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Customer;
    type Error = Error;
    type Future = CommandFuture<Customer>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CustomerDetailRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            require_positive("customerId", req.customer_id)?;
            Ok(database.find_customer(req.customer_id).await?)
        })
    }
}

impl<D> Service<UpdateCustomerPointsRequest> for DomainLogic<D>
where
    D: DatabasePort + 'static,
{
    type Response = Customer;
    type Error = Error;
    type Future = CommandFuture<Customer>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UpdateCustomerPointsRequest) -> Self::Future {
        let database = self.database.clone();
        Box::pin(async move {
            require_positive("customerId", req.customer_id)?;
            require_non_negative("customerPoints", req.points)?;

            let customer = database.find_customer(req.customer_id).await.map_err(|err| {
                debug!(error = %err, "customer lookup failed");
                Error::NotFound(Entity::Customer)
            })?;
            let updated = database
                .update_customer_points(customer.id, req.points)
                .await?;
            info!(
                customer_id = updated.id,
                old_points = customer.points,
                new_points = updated.points,
                "customer points updated"
            );

            Ok(updated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryDatabase, commands::ErrorKind,
        ports::database::MockDatabasePort,
    };
    use mockall::predicate::*;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::{BoxError, ServiceExt};

    #[fixture]
    fn domain() -> DomainLogic<MemoryDatabase> {
        DomainLogic::new(Arc::new(MemoryDatabase::default()))
    }

    fn create_request(email: &str, points: i64) -> CreateCustomerRequest {
        CreateCustomerRequest {
            full_name: "Jane Doe".to_string(),
            email: email.to_string(),
            points,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_list_detail(
        domain: DomainLogic<MemoryDatabase>,
    ) -> Result<(), BoxError> {
        let created = domain
            .clone()
            .oneshot(create_request("jane@example.com", 1000))
            .await?;

        let customers = domain.clone().oneshot(ListCustomersRequest).await?;
        assert_that!(customers).has_length(1);

        let res = domain
            .oneshot(CustomerDetailRequest {
                customer_id: created.id,
            })
            .await;
        assert_that!(res)
            .is_ok()
            .matches(|customer| customer.points == 1000 && customer.email == "jane@example.com");

        Ok(())
    }

    #[rstest]
    #[case(create_request("", 0), "email is required")]
    #[case(create_request("not-an-email", 0), "email must be a valid email address")]
    #[case(create_request("jane@example.com", -1), "points invalid format")]
    #[tokio::test]
    async fn test_create_invalid(
        domain: DomainLogic<MemoryDatabase>,
        #[case] req: CreateCustomerRequest,
        #[case] message: &str,
    ) {
        let res = domain.oneshot(req).await;

        assert_that!(res).is_err().matches(|err| {
            err.kind() == ErrorKind::Validation && err.to_string() == message
        });
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_duplicate_email(
        domain: DomainLogic<MemoryDatabase>,
    ) -> Result<(), BoxError> {
        domain
            .clone()
            .oneshot(create_request("jane@example.com", 0))
            .await?;

        let res = domain.oneshot(create_request("jane@example.com", 0)).await;

        assert_that!(res).is_err().matches(|err| {
            err.kind() == ErrorKind::Validation && err.to_string() == "email already exists"
        });

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_points(domain: DomainLogic<MemoryDatabase>) -> Result<(), BoxError> {
        let created = domain
            .clone()
            .oneshot(create_request("jane@example.com", 10))
            .await?;

        let res = domain
            .oneshot(UpdateCustomerPointsRequest {
                customer_id: created.id,
                points: 250,
            })
            .await;

        assert_that!(res)
            .is_ok()
            .matches(|customer| customer.points == 250);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_points_negative() {
        // GIVEN a database port that must not be touched
        let mut database = MockDatabasePort::new();
        database.expect_find_customer().never();
        database.expect_update_customer_points().never();
        let domain = DomainLogic::new(Arc::new(database));

        let res = domain
            .oneshot(UpdateCustomerPointsRequest {
                customer_id: 1,
                points: -10,
            })
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.to_string() == "customerPoints invalid format");
    }

    #[tokio::test]
    async fn test_update_points_unknown_customer() {
        let mut database = MockDatabasePort::new();
        database
            .expect_find_customer()
            .times(1)
            .with(eq(9))
            .returning(|id| {
                Err(crate::ports::database::Error::NotFound {
                    entity: Entity::Customer,
                    id,
                })
            });
        database.expect_update_customer_points().never();
        let domain = DomainLogic::new(Arc::new(database));

        let res = domain
            .oneshot(UpdateCustomerPointsRequest {
                customer_id: 9,
                points: 10,
            })
            .await;

        assert_that!(res)
            .is_err()
            .matches(|err| err.to_string() == "customer not found");
    }
}
