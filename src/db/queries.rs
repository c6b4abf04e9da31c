use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::models::time::{format_date, format_time, parse_date, parse_time, TIMESTAMP_FORMAT};
use crate::models::{
    Booking, BookingLine, BookingStatus, Customer, Employee, Service, TimeOff, WeeklyScheduleEntry,
};
use crate::services::availability::{AvailabilityError, Snapshot};

fn integrity(msg: String) -> anyhow::Error {
    AvailabilityError::DataIntegrity(msg).into()
}

fn now_timestamp() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Employees ──

pub fn list_employees(conn: &Connection) -> anyhow::Result<Vec<Employee>> {
    let mut stmt = conn.prepare("SELECT id, name, phone, bio FROM employees ORDER BY name ASC")?;
    let rows = stmt.query_map([], parse_employee_row)?;

    let mut employees = vec![];
    for row in rows {
        employees.push(row?);
    }
    Ok(employees)
}

pub fn get_employee(conn: &Connection, id: &str) -> anyhow::Result<Option<Employee>> {
    let employee = conn
        .query_row(
            "SELECT id, name, phone, bio FROM employees WHERE id = ?1",
            params![id],
            parse_employee_row,
        )
        .optional()?;
    Ok(employee)
}

pub fn get_employee_by_phone(conn: &Connection, phone: &str) -> anyhow::Result<Option<Employee>> {
    let employee = conn
        .query_row(
            "SELECT id, name, phone, bio FROM employees WHERE phone = ?1 LIMIT 1",
            params![phone],
            parse_employee_row,
        )
        .optional()?;
    Ok(employee)
}

pub fn create_employee(conn: &Connection, employee: &Employee) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO employees (id, name, phone, bio) VALUES (?1, ?2, ?3, ?4)",
        params![employee.id, employee.name, employee.phone, employee.bio],
    )?;
    Ok(())
}

pub fn update_employee(conn: &Connection, employee: &Employee) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE employees SET name = ?1, phone = ?2, bio = ?3 WHERE id = ?4",
        params![employee.name, employee.phone, employee.bio, employee.id],
    )?;
    Ok(count > 0)
}

/// Fails with a constraint violation while bookings still reference the employee.
pub fn delete_employee(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM employees WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_employee_row(row: &rusqlite::Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        bio: row.get(3)?,
    })
}

// ── Services ──

pub fn list_services(conn: &Connection) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, duration_minutes, price FROM services ORDER BY name ASC",
    )?;
    let rows = stmt.query_map([], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let service = conn
        .query_row(
            "SELECT id, name, duration_minutes, price FROM services WHERE id = ?1",
            params![id],
            parse_service_row,
        )
        .optional()?;
    Ok(service)
}

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, name, duration_minutes, price) VALUES (?1, ?2, ?3, ?4)",
        params![service.id, service.name, service.duration_minutes, service.price],
    )?;
    Ok(())
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, duration_minutes = ?2, price = ?3 WHERE id = ?4",
        params![service.name, service.duration_minutes, service.price, service.id],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        duration_minutes: row.get(2)?,
        price: row.get(3)?,
    })
}

// ── Customers ──

pub fn list_customers(conn: &Connection) -> anyhow::Result<Vec<Customer>> {
    let mut stmt =
        conn.prepare("SELECT id, name, phone, email FROM customers ORDER BY name ASC")?;
    let rows = stmt.query_map([], parse_customer_row)?;

    let mut customers = vec![];
    for row in rows {
        customers.push(row?);
    }
    Ok(customers)
}

pub fn get_customer(conn: &Connection, id: &str) -> anyhow::Result<Option<Customer>> {
    let customer = conn
        .query_row(
            "SELECT id, name, phone, email FROM customers WHERE id = ?1",
            params![id],
            parse_customer_row,
        )
        .optional()?;
    Ok(customer)
}

pub fn get_customer_by_phone(conn: &Connection, phone: &str) -> anyhow::Result<Option<Customer>> {
    let customer = conn
        .query_row(
            "SELECT id, name, phone, email FROM customers WHERE phone = ?1",
            params![phone],
            parse_customer_row,
        )
        .optional()?;
    Ok(customer)
}

/// Returns the customer registered under `phone`, creating one if there is none.
/// An existing customer keeps their stored name and email.
pub fn find_or_create_customer(
    conn: &Connection,
    name: &str,
    phone: &str,
    email: Option<&str>,
) -> anyhow::Result<Customer> {
    if let Some(existing) = get_customer_by_phone(conn, phone)? {
        return Ok(existing);
    }

    let customer = Customer {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        email: email.map(str::to_string),
    };
    conn.execute(
        "INSERT INTO customers (id, name, phone, email) VALUES (?1, ?2, ?3, ?4)",
        params![customer.id, customer.name, customer.phone, customer.email],
    )?;
    Ok(customer)
}

fn parse_customer_row(row: &rusqlite::Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
    })
}

// ── Weekly Schedule ──

pub fn get_schedule(
    conn: &Connection,
    employee_id: &str,
) -> anyhow::Result<Vec<WeeklyScheduleEntry>> {
    let mut stmt = conn.prepare(
        "SELECT employee_id, day_of_week, start_time, end_time
         FROM employee_schedule WHERE employee_id = ?1 ORDER BY day_of_week ASC",
    )?;
    let rows = stmt.query_map(params![employee_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut entries = vec![];
    for row in rows {
        let (employee_id, day, start, end) = row?;
        if !(1..=7).contains(&day) {
            return Err(integrity(format!(
                "schedule for employee {employee_id} has day_of_week {day}"
            )));
        }
        let start_time = parse_time(&start)
            .ok_or_else(|| integrity(format!("unparseable schedule start time: {start}")))?;
        let end_time = parse_time(&end)
            .ok_or_else(|| integrity(format!("unparseable schedule end time: {end}")))?;
        entries.push(WeeklyScheduleEntry {
            employee_id,
            day_of_week: day as u8,
            start_time,
            end_time,
        });
    }
    Ok(entries)
}

/// Replaces every schedule entry of one employee in a single transaction.
pub fn replace_schedule(
    conn: &Connection,
    employee_id: &str,
    entries: &[WeeklyScheduleEntry],
) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM employee_schedule WHERE employee_id = ?1",
        params![employee_id],
    )?;
    for entry in entries {
        tx.execute(
            "INSERT INTO employee_schedule (employee_id, day_of_week, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                employee_id,
                entry.day_of_week,
                format_time(entry.start_time),
                format_time(entry.end_time),
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

// ── Time Off ──

pub fn list_time_off(conn: &Connection, employee_id: &str) -> anyhow::Result<Vec<TimeOff>> {
    let mut stmt = conn.prepare(
        "SELECT id, employee_id, date, reason FROM employee_time_off
         WHERE employee_id = ?1 ORDER BY date ASC",
    )?;
    let rows = stmt.query_map(params![employee_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut time_off = vec![];
    for row in rows {
        let (id, employee_id, date, reason) = row?;
        let date = parse_date(&date)
            .ok_or_else(|| integrity(format!("unparseable time-off date: {date}")))?;
        time_off.push(TimeOff {
            id,
            employee_id,
            date,
            reason,
        });
    }
    Ok(time_off)
}

/// Fails with a constraint violation if the employee already has that date off.
pub fn add_time_off(conn: &Connection, time_off: &TimeOff) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO employee_time_off (id, employee_id, date, reason) VALUES (?1, ?2, ?3, ?4)",
        params![
            time_off.id,
            time_off.employee_id,
            format_date(time_off.date),
            time_off.reason,
        ],
    )?;
    Ok(())
}

pub fn delete_time_off(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM employee_time_off WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "id, employee_id, customer_id, date, start_time, end_time, status, created_at, updated_at";

#[derive(Debug, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub employee_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut clauses = vec![];
    let mut values: Vec<String> = vec![];

    if let Some(status) = filter.status {
        values.push(status.as_str().to_string());
        clauses.push(format!("status = ?{}", values.len()));
    }
    if let Some(employee_id) = &filter.employee_id {
        values.push(employee_id.clone());
        clauses.push(format!("employee_id = ?{}", values.len()));
    }
    if let Some(date) = filter.date {
        values.push(format_date(date));
        clauses.push(format!("date = ?{}", values.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let limit = filter.limit.unwrap_or(100).max(0);
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings {where_clause}
         ORDER BY date DESC, start_time DESC LIMIT {limit}"
    );

    query_bookings(conn, &sql, values)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    Ok(query_bookings(conn, &sql, vec![id.to_string()])?.into_iter().next())
}

/// Every booking of an employee on one date, whatever its status.
pub fn bookings_for_employee_on(
    conn: &Connection,
    employee_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE employee_id = ?1 AND date = ?2 ORDER BY start_time ASC"
    );
    query_bookings(conn, &sql, vec![employee_id.to_string(), format_date(date)])
}

/// Bookings of an employee with `from <= date <= to`.
pub fn bookings_for_employee_between(
    conn: &Connection,
    employee_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE employee_id = ?1 AND date >= ?2 AND date <= ?3
         ORDER BY date ASC, start_time ASC"
    );
    query_bookings(
        conn,
        &sql,
        vec![employee_id.to_string(), format_date(from), format_date(to)],
    )
}

/// Bookings in any of `statuses` with `from <= date <= to`.
pub fn bookings_with_status_between(
    conn: &Connection,
    statuses: &[BookingStatus],
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE date >= ?1 AND date <= ?2 AND status IN ({})
         ORDER BY date ASC, start_time ASC",
        placeholders(3, statuses.len())
    );
    let mut values = vec![format_date(from), format_date(to)];
    values.extend(statuses.iter().map(|s| s.as_str().to_string()));
    query_bookings(conn, &sql, values)
}

pub fn bookings_for_customer(
    conn: &Connection,
    customer_id: &str,
    statuses: &[BookingStatus],
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE customer_id = ?1 AND status IN ({})
         ORDER BY date ASC, start_time ASC",
        placeholders(2, statuses.len())
    );
    let mut values = vec![customer_id.to_string()];
    values.extend(statuses.iter().map(|s| s.as_str().to_string()));
    query_bookings(conn, &sql, values)
}

/// Inserts `booking` only if no occupying booking of the same employee
/// overlaps it. Returns whether the row was written.
pub fn insert_booking_if_free(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let occupying = BookingStatus::OCCUPYING
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO bookings ({BOOKING_COLUMNS})
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9
         WHERE NOT EXISTS (
             SELECT 1 FROM bookings
             WHERE employee_id = ?2 AND date = ?4
               AND status IN ({occupying})
               AND start_time < ?6 AND end_time > ?5
         )"
    );

    let count = conn.execute(
        &sql,
        params![
            booking.id,
            booking.employee_id,
            booking.customer_id,
            format_date(booking.date),
            format_time(booking.start_time),
            format_time(booking.end_time),
            booking.status.as_str(),
            booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(count == 1)
}

/// Moves a booking to `to` only if its current status is one of `from`.
/// Returns true when exactly one row changed.
pub fn transition_booking_status(
    conn: &Connection,
    id: &str,
    from: &[BookingStatus],
    to: BookingStatus,
) -> anyhow::Result<bool> {
    if from.is_empty() {
        return Ok(false);
    }
    let sql = format!(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status IN ({})",
        placeholders(4, from.len())
    );
    let mut values = vec![to.as_str().to_string(), now_timestamp(), id.to_string()];
    values.extend(from.iter().map(|s| s.as_str().to_string()));

    let count = conn.execute(&sql, params_from_iter(values))?;
    Ok(count == 1)
}

pub fn insert_booking_lines(
    conn: &Connection,
    booking_id: &str,
    lines: &[(String, u32)],
) -> anyhow::Result<()> {
    for (service_id, quantity) in lines {
        conn.execute(
            "INSERT INTO booking_services (booking_id, service_id, quantity)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(booking_id, service_id)
             DO UPDATE SET quantity = quantity + excluded.quantity",
            params![booking_id, service_id, quantity],
        )?;
    }
    Ok(())
}

pub fn get_booking_lines(conn: &Connection, booking_id: &str) -> anyhow::Result<Vec<BookingLine>> {
    let mut stmt = conn.prepare(
        "SELECT bs.service_id, s.name, bs.quantity
         FROM booking_services bs JOIN services s ON s.id = bs.service_id
         WHERE bs.booking_id = ?1 ORDER BY s.name ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok(BookingLine {
            service_id: row.get(0)?,
            service_name: row.get(1)?,
            quantity: row.get(2)?,
        })
    })?;

    let mut lines = vec![];
    for row in rows {
        lines.push(row?);
    }
    Ok(lines)
}

/// Everything the availability engine needs for one employee and date.
pub fn availability_snapshot(
    conn: &Connection,
    employee_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Snapshot> {
    Ok(Snapshot {
        schedule: get_schedule(conn, employee_id)?,
        time_off: list_time_off(conn, employee_id)?,
        bookings: bookings_for_employee_on(conn, employee_id, date)?,
    })
}

fn query_bookings(
    conn: &Connection,
    sql: &str,
    values: Vec<String>,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(values), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let employee_id: String = row.get(1)?;
    let customer_id: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    let date = parse_date(&date_str)
        .ok_or_else(|| integrity(format!("booking {id}: unparseable date {date_str}")))?;
    let start_time = parse_time(&start_str)
        .ok_or_else(|| integrity(format!("booking {id}: unparseable start time {start_str}")))?;
    let end_time = parse_time(&end_str)
        .ok_or_else(|| integrity(format!("booking {id}: unparseable end time {end_str}")))?;
    let status = status_str
        .parse::<BookingStatus>()
        .map_err(|e| integrity(format!("booking {id}: {e}")))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
        .map_err(|_| integrity(format!("booking {id}: unparseable created_at {created_at_str}")))?;
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, TIMESTAMP_FORMAT)
        .map_err(|_| integrity(format!("booking {id}: unparseable updated_at {updated_at_str}")))?;

    Ok(Booking {
        id,
        employee_id,
        customer_id,
        date,
        start_time,
        end_time,
        status,
        created_at,
        updated_at,
    })
}
