use chrono::NaiveDate;
use fleet_core::db::open_db_in_memory;
use fleet_core::service::client_service::ClientService;
use fleet_core::service::company_service::CompanyService;
use fleet_core::service::employee_service::EmployeeService;
use fleet_core::service::transport_service::TransportService;
use fleet_core::service::vehicle_service::VehicleService;
use fleet_core::{
    NewClient, NewEmployee, NewTransport, NewVehicle, ServiceError, TransportType, VehicleType,
};
use rust_decimal::Decimal;

#[test]
fn create_and_find_roundtrip_starts_with_zero_revenue() {
    let conn = open_db_in_memory().unwrap();
    let service = CompanyService::new(&conn);

    let created = service.create("Acme Ltd", Some("1 Main St")).unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.revenue, Decimal::ZERO);

    let loaded = service.find_by_id(created.id).unwrap().unwrap();
    assert_eq!(loaded.name, "Acme Ltd");
    assert_eq!(loaded.address.as_deref(), Some("1 Main St"));
    assert_eq!(loaded.revenue, Decimal::ZERO);
    assert_eq!(service.find_by_name("Acme Ltd").unwrap(), Some(loaded));
}

#[test]
fn blank_name_is_rejected_and_nothing_is_stored() {
    let conn = open_db_in_memory().unwrap();
    let service = CompanyService::new(&conn);

    let err = service.create("   ", None).unwrap_err();
    match err {
        ServiceError::Validation(err) => {
            assert!(err.has_field("name"));
            assert_eq!(err.violations()[0].message, "Company name is required");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.count().unwrap(), 0);
}

#[test]
fn update_keeps_revenue_and_rejects_missing_company() {
    let conn = open_db_in_memory().unwrap();
    let service = CompanyService::new(&conn);

    let company = service.create("Acme Ltd", None).unwrap();
    service
        .update_revenue(company.id, Decimal::new(12_500, 2))
        .unwrap();

    let mut edited = company.clone();
    edited.name = "Acme Logistics".to_string();
    edited.revenue = Decimal::new(999_999, 2);
    let updated = service.update(&edited).unwrap();
    assert_eq!(updated.name, "Acme Logistics");
    assert_eq!(updated.revenue, Decimal::new(12_500, 2));

    let mut ghost = company;
    ghost.id = 99;
    assert!(matches!(
        service.update(&ghost),
        Err(ServiceError::NotFound { entity: "company", id: 99 })
    ));
}

#[test]
fn revenue_cannot_drop_below_zero() {
    let conn = open_db_in_memory().unwrap();
    let service = CompanyService::new(&conn);
    let company = service.create("Acme Ltd", None).unwrap();

    service
        .update_revenue(company.id, Decimal::new(10_000, 2))
        .unwrap();
    let err = service
        .update_revenue(company.id, Decimal::new(-10_001, 2))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref e) if e.has_field("revenue")));

    let reloaded = service.find_by_id(company.id).unwrap().unwrap();
    assert_eq!(reloaded.revenue, Decimal::new(10_000, 2));
}

#[test]
fn sorting_by_name_and_by_revenue() {
    let conn = open_db_in_memory().unwrap();
    let service = CompanyService::new(&conn);

    let zeta = service.create("Zeta", None).unwrap();
    let alpha = service.create("Alpha", None).unwrap();
    let mid = service.create("Mid", None).unwrap();
    service.update_revenue(mid.id, Decimal::new(300, 0)).unwrap();
    service.update_revenue(zeta.id, Decimal::new(100, 0)).unwrap();

    let by_name: Vec<String> = service
        .find_all_sorted_by_name()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(by_name, vec!["Alpha", "Mid", "Zeta"]);

    let by_revenue: Vec<i64> = service
        .find_all_sorted_by_revenue()
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(by_revenue, vec![mid.id, zeta.id, alpha.id]);
}

#[test]
fn delete_cascades_to_owned_records() {
    let conn = open_db_in_memory().unwrap();
    let companies = CompanyService::new(&conn);
    let employees = EmployeeService::new(&conn);

    let doomed = companies.create("Doomed", None).unwrap();
    let kept = companies.create("Kept", None).unwrap();
    employees
        .create(&NewEmployee::new(doomed.id, "Jane", "Doe", Decimal::new(1_500, 0)))
        .unwrap();
    let survivor = employees
        .create(&NewEmployee::new(kept.id, "John", "Roe", Decimal::new(1_400, 0)))
        .unwrap();

    companies.delete(doomed.id).unwrap();

    assert!(companies.find_by_id(doomed.id).unwrap().is_none());
    assert!(employees.find_by_company(doomed.id).unwrap().is_empty());
    assert_eq!(employees.find_all().unwrap(), vec![survivor]);
    assert!(matches!(
        companies.delete(doomed.id),
        Err(ServiceError::NotFound { entity: "company", .. })
    ));
}

#[test]
fn delete_refuses_while_other_company_uses_its_driver() {
    let conn = open_db_in_memory().unwrap();
    let companies = CompanyService::new(&conn);
    let lender = companies.create("Lender", None).unwrap();
    let hirer = companies.create("Hirer", None).unwrap();

    let driver = EmployeeService::new(&conn)
        .create(&NewEmployee::new(lender.id, "Jane", "Doe", Decimal::new(1_500, 0)))
        .unwrap();
    let vehicle = VehicleService::new(&conn)
        .create(&NewVehicle::new(hirer.id, "AB1234CD", VehicleType::Truck))
        .unwrap();
    let client = ClientService::new(&conn)
        .create(&NewClient::new(hirer.id, "Beta Corp"))
        .unwrap();
    let transports = TransportService::new(&conn);
    let borrowed = transports
        .create(&NewTransport::new(
            hirer.id,
            driver.id,
            vehicle.id,
            client.id,
            "Sofia",
            "Varna",
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            TransportType::Goods,
            Decimal::new(50_000, 2),
        ))
        .unwrap();

    match companies.delete(lender.id).unwrap_err() {
        ServiceError::Validation(err) => assert!(err.has_field("id")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(companies.find_by_id(lender.id).unwrap().is_some());
    assert!(EmployeeService::new(&conn).find_by_id(driver.id).unwrap().is_some());

    // Once the borrowing transport is gone the cascade goes through.
    transports.delete(borrowed.id).unwrap();
    companies.delete(lender.id).unwrap();
    assert!(companies.find_by_id(lender.id).unwrap().is_none());
    assert!(companies.find_by_id(hirer.id).unwrap().is_some());
}
