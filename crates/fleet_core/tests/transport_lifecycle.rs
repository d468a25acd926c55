use chrono::NaiveDate;
use fleet_core::db::open_db_in_memory;
use fleet_core::service::client_service::ClientService;
use fleet_core::service::company_service::CompanyService;
use fleet_core::service::employee_service::EmployeeService;
use fleet_core::service::transport_service::TransportService;
use fleet_core::service::vehicle_service::VehicleService;
use fleet_core::{
    Client, Company, Employee, NewClient, NewEmployee, NewTransport, NewVehicle, Qualification,
    ServiceError, TransportType, Vehicle, VehicleType,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

struct Fixture {
    company: Company,
    driver: Employee,
    vehicle: Vehicle,
    client: Client,
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn acme(conn: &Connection) -> Fixture {
    let company = CompanyService::new(conn)
        .create("Acme Ltd", Some("1 Main St"))
        .unwrap();
    let driver = EmployeeService::new(conn)
        .create(
            &NewEmployee::new(company.id, "Jane", "Doe", Decimal::new(250_000, 2))
                .with_qualifications([Qualification::Standard]),
        )
        .unwrap();
    let vehicle = VehicleService::new(conn)
        .create(&NewVehicle::new(company.id, "AB1234CD", VehicleType::Truck))
        .unwrap();
    let client = ClientService::new(conn)
        .create(&NewClient::new(company.id, "Beta Corp"))
        .unwrap();
    Fixture {
        company,
        driver,
        vehicle,
        client,
    }
}

fn trip(fx: &Fixture, end: &str, day: u32, price_cents: i64) -> NewTransport {
    NewTransport::new(
        fx.company.id,
        fx.driver.id,
        fx.vehicle.id,
        fx.client.id,
        "Sofia",
        end,
        date(2024, 1, day),
        date(2024, 1, day + 1),
        TransportType::Goods,
        Decimal::new(price_cents, 2),
    )
}

fn revenue(conn: &Connection, company_id: i64) -> Decimal {
    CompanyService::new(conn)
        .find_by_id(company_id)
        .unwrap()
        .unwrap()
        .revenue
}

#[test]
fn acme_scenario_toggles_revenue() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    assert_eq!(
        (fx.company.id, fx.driver.id, fx.vehicle.id, fx.client.id),
        (1, 1, 1, 1)
    );

    let service = TransportService::new(&conn);
    let transport = service
        .create(&trip(&fx, "Varna", 10, 50_000).with_cargo("Furniture", Some(800.0)))
        .unwrap();
    assert_eq!(transport.id, 1);
    assert!(!transport.paid);
    assert_eq!(transport.destination(), "Sofia -> Varna");
    assert_eq!(revenue(&conn, fx.company.id), Decimal::ZERO);

    let paid = service.mark_as_paid(transport.id).unwrap();
    assert!(paid.paid);
    assert_eq!(revenue(&conn, fx.company.id), Decimal::new(50_000, 2));

    let unpaid = service.mark_as_unpaid(transport.id).unwrap();
    assert!(!unpaid.paid);
    assert_eq!(revenue(&conn, fx.company.id), Decimal::new(0, 2));
}

#[test]
fn marking_twice_does_not_double_count() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let service = TransportService::new(&conn);
    let transport = service.create(&trip(&fx, "Varna", 10, 50_000)).unwrap();

    service.mark_as_paid(transport.id).unwrap();
    let again = service.mark_as_paid(transport.id).unwrap();
    assert!(again.paid);
    assert_eq!(revenue(&conn, fx.company.id), Decimal::new(50_000, 2));

    service.mark_as_unpaid(transport.id).unwrap();
    service.mark_as_unpaid(transport.id).unwrap();
    assert_eq!(revenue(&conn, fx.company.id), Decimal::ZERO);
}

#[test]
fn revenue_equals_sum_of_paid_prices_after_any_sequence() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let service = TransportService::new(&conn);

    let ids: Vec<i64> = [(5, 12_050), (6, 30_000), (7, 9_999), (8, 100)]
        .into_iter()
        .map(|(day, cents)| service.create(&trip(&fx, "Plovdiv", day, cents)).unwrap().id)
        .collect();

    let steps: [(usize, bool); 9] = [
        (0, true),
        (1, true),
        (0, false),
        (2, true),
        (3, true),
        (1, true),
        (3, false),
        (0, true),
        (2, false),
    ];
    for (index, paid) in steps {
        if paid {
            service.mark_as_paid(ids[index]).unwrap();
        } else {
            service.mark_as_unpaid(ids[index]).unwrap();
        }

        let expected: Decimal = service
            .find_by_company(fx.company.id)
            .unwrap()
            .iter()
            .filter(|t| t.paid)
            .map(|t| t.price)
            .sum();
        assert_eq!(revenue(&conn, fx.company.id), expected);
        assert_eq!(
            service.total_revenue_by_company(fx.company.id).unwrap(),
            expected
        );
    }
}

#[test]
fn missing_references_are_all_reported_and_nothing_is_stored() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let service = TransportService::new(&conn);

    let mut draft = trip(&fx, "Varna", 10, 50_000);
    draft.company_id = 77;
    draft.driver_id = 88;
    draft.client_id = 99;

    match service.create(&draft).unwrap_err() {
        ServiceError::Validation(err) => {
            let messages: Vec<&str> = err
                .violations()
                .iter()
                .map(|v| v.message.as_str())
                .collect();
            assert_eq!(
                messages,
                vec![
                    "Company not found with id: 77",
                    "Driver not found with id: 88",
                    "Client not found with id: 99",
                ]
            );
            assert!(!err.has_field("vehicle_id"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.count().unwrap(), 0);
}

#[test]
fn arrival_before_departure_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let service = TransportService::new(&conn);

    let mut draft = trip(&fx, "Varna", 10, 50_000);
    draft.arrival_date = date(2024, 1, 9);
    match service.create(&draft).unwrap_err() {
        ServiceError::Validation(err) => {
            assert!(err.has_field("arrival_date"));
            assert_eq!(
                err.violations()[0].message,
                "Arrival date cannot be before departure date"
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    // Same-day trips are fine.
    draft.arrival_date = draft.departure_date;
    service.create(&draft).unwrap();
}

#[test]
fn non_positive_price_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let err = TransportService::new(&conn)
        .create(&trip(&fx, "Varna", 10, 0))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref e) if e.has_field("price")));
}

#[test]
fn price_rounding_to_zero_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let service = TransportService::new(&conn);

    let mut draft = trip(&fx, "Varna", 10, 50_000);
    draft.price = Decimal::new(4, 3);
    let err = service.create(&draft).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref e) if e.has_field("price")));
    assert_eq!(service.count().unwrap(), 0);

    let mut stored = service.create(&trip(&fx, "Varna", 10, 50_000)).unwrap();
    stored.price = Decimal::new(1, 3);
    let err = service.update(&stored).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref e) if e.has_field("price")));
}

#[test]
fn update_of_paid_transport_moves_revenue_by_price_difference() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let service = TransportService::new(&conn);

    let transport = service.create(&trip(&fx, "Varna", 10, 50_000)).unwrap();
    let paid = service.mark_as_paid(transport.id).unwrap();

    let mut edited = paid.clone();
    edited.price = Decimal::new(45_000, 2);
    edited.paid = false;
    edited.end_point = "Burgas".to_string();
    let updated = service.update(&edited).unwrap();

    assert!(updated.paid);
    assert_eq!(updated.end_point, "Burgas");
    assert_eq!(revenue(&conn, fx.company.id), Decimal::new(45_000, 2));

    let mut invalid = updated.clone();
    invalid.arrival_date = date(2023, 12, 31);
    assert!(matches!(
        service.update(&invalid),
        Err(ServiceError::Validation(ref e)) if e.has_field("arrival_date")
    ));
    assert_eq!(revenue(&conn, fx.company.id), Decimal::new(45_000, 2));
}

#[test]
fn deleting_paid_transport_reverses_its_revenue() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let service = TransportService::new(&conn);

    let kept = service.create(&trip(&fx, "Varna", 10, 20_000)).unwrap();
    let doomed = service.create(&trip(&fx, "Ruse", 12, 30_000)).unwrap();
    service.mark_as_paid(kept.id).unwrap();
    service.mark_as_paid(doomed.id).unwrap();
    assert_eq!(revenue(&conn, fx.company.id), Decimal::new(50_000, 2));

    service.delete(doomed.id).unwrap();
    assert_eq!(revenue(&conn, fx.company.id), Decimal::new(20_000, 2));
    assert!(service.find_by_id(doomed.id).unwrap().is_none());
    assert!(matches!(
        service.delete(doomed.id),
        Err(ServiceError::NotFound { entity: "transport", .. })
    ));
}

#[test]
fn parties_with_transports_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    TransportService::new(&conn)
        .create(&trip(&fx, "Varna", 10, 50_000))
        .unwrap();

    assert!(matches!(
        EmployeeService::new(&conn).delete(fx.driver.id),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        VehicleService::new(&conn).delete(fx.vehicle.id),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        ClientService::new(&conn).delete(fx.client.id),
        Err(ServiceError::Validation(_))
    ));
    assert!(EmployeeService::new(&conn)
        .find_by_id(fx.driver.id)
        .unwrap()
        .is_some());
}

#[test]
fn unpaid_clients_include_only_clients_with_open_transports() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let clients = ClientService::new(&conn);
    let service = TransportService::new(&conn);

    let settled = clients
        .create(&NewClient::new(fx.company.id, "Settled Ltd"))
        .unwrap();
    clients
        .create(&NewClient::new(fx.company.id, "Idle Ltd"))
        .unwrap();

    service.create(&trip(&fx, "Varna", 10, 50_000)).unwrap();
    let mut settled_trip = trip(&fx, "Ruse", 12, 10_000);
    settled_trip.client_id = settled.id;
    let settled_trip = service.create(&settled_trip).unwrap();
    service.mark_as_paid(settled_trip.id).unwrap();

    let unpaid = clients
        .find_clients_with_unpaid_transports(fx.company.id)
        .unwrap();
    assert_eq!(unpaid, vec![fx.client.clone()]);
    assert_eq!(service.find_unpaid_by_client(fx.client.id).unwrap().len(), 1);
    assert!(service.find_unpaid_by_client(settled.id).unwrap().is_empty());
}

#[test]
fn queries_filter_and_sort_transports() {
    let conn = open_db_in_memory().unwrap();
    let fx = acme(&conn);
    let service = TransportService::new(&conn);

    let varna = service.create(&trip(&fx, "Varna", 3, 10_000)).unwrap();
    let burgas = service.create(&trip(&fx, "Burgas", 10, 20_000)).unwrap();
    let mut bus = trip(&fx, "Veliko Tarnovo", 20, 30_000).with_passengers(40);
    bus.transport_type = TransportType::Passengers;
    let bus = service.create(&bus).unwrap();

    let by_destination: Vec<i64> = service
        .find_by_company_sorted_by_destination(fx.company.id)
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(by_destination, vec![burgas.id, varna.id, bus.id]);

    let matching = service.find_by_destination(fx.company.id, "VAR").unwrap();
    assert_eq!(matching, vec![varna.clone()]);

    let january_start = service
        .find_by_date_range(fx.company.id, date(2024, 1, 1), date(2024, 1, 11))
        .unwrap();
    assert_eq!(january_start, vec![varna.clone(), burgas.clone()]);

    let passengers = service
        .find_by_transport_type(fx.company.id, TransportType::Passengers)
        .unwrap();
    assert_eq!(passengers, vec![bus]);
    assert_eq!(passengers[0].passenger_count, Some(40));

    service.mark_as_paid(varna.id).unwrap();
    service.mark_as_paid(burgas.id).unwrap();
    assert_eq!(
        service
            .revenue_by_date_range(fx.company.id, date(2024, 1, 1), date(2024, 1, 5))
            .unwrap(),
        Decimal::new(10_000, 2)
    );
    assert_eq!(
        service.total_revenue_by_driver(fx.driver.id).unwrap(),
        Decimal::new(30_000, 2)
    );
    assert_eq!(service.count_by_driver(fx.driver.id).unwrap(), 3);
    assert_eq!(service.count_by_company(fx.company.id).unwrap(), 3);
    assert_eq!(service.find_by_vehicle(fx.vehicle.id).unwrap().len(), 3);
    assert_eq!(service.find_by_client(fx.client.id).unwrap().len(), 3);
}
