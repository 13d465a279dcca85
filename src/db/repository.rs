use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::models::{
    AttendanceRecord, Enrollment, Member, MemberDetails, NewProgramRequest, Program, RosterEntry,
    SalesSummary, ScheduleSlot, UpdateMemberRequest,
};

const PROGRAM_COLUMNS: &str =
    "id, name, monthly_price, per_class_price, classes_per_week, instructor, created_at, updated_at";

const MEMBER_COLUMNS: &str =
    "id, name, gender, birth_date, age, address, phone, created_at, updated_at";

const ENROLLMENT_COLUMNS: &str = "id, member_id, program_id, duration_months, total_classes, \
    purchased_classes, remaining_classes, total_amount, original_amount, payment_status, \
    start_date, created_at, updated_at";

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

pub async fn fetch_programs(conn: &mut SqliteConnection) -> Result<Vec<Program>, sqlx::Error> {
    let mut programs = sqlx::query_as::<_, Program>(&format!(
        "SELECT {} FROM programs ORDER BY name",
        PROGRAM_COLUMNS
    ))
    .fetch_all(&mut *conn)
    .await?;

    for program in programs.iter_mut() {
        program.schedule = fetch_schedule(conn, &program.id).await?;
    }
    Ok(programs)
}

pub async fn find_program_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Program>, sqlx::Error> {
    let program = sqlx::query_as::<_, Program>(&format!(
        "SELECT {} FROM programs WHERE id = ?",
        PROGRAM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match program {
        Some(mut p) => {
            p.schedule = fetch_schedule(conn, &p.id).await?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

pub async fn fetch_schedule(
    conn: &mut SqliteConnection,
    program_id: &str,
) -> Result<Vec<ScheduleSlot>, sqlx::Error> {
    sqlx::query_as::<_, ScheduleSlot>(
        "SELECT day_of_week, start_time, end_time FROM program_schedules WHERE program_id = ? ORDER BY id",
    )
    .bind(program_id)
    .fetch_all(conn)
    .await
}

async fn insert_schedule(
    conn: &mut SqliteConnection,
    program_id: &str,
    schedule: &[ScheduleSlot],
) -> Result<(), sqlx::Error> {
    for slot in schedule {
        sqlx::query(
            "INSERT INTO program_schedules (program_id, day_of_week, start_time, end_time) VALUES (?, ?, ?, ?)",
        )
        .bind(program_id)
        .bind(&slot.day_of_week)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn insert_program(
    conn: &mut SqliteConnection,
    req: NewProgramRequest,
) -> Result<Program, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO programs
            (id, name, monthly_price, per_class_price, classes_per_week, instructor,
            created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(req.monthly_price)
    .bind(req.per_class_price)
    .bind(req.classes_per_week)
    .bind(&req.instructor)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    insert_schedule(conn, &id, &req.schedule).await?;

    Ok(Program {
        id,
        name: req.name,
        monthly_price: req.monthly_price,
        per_class_price: req.per_class_price,
        classes_per_week: req.classes_per_week,
        instructor: req.instructor,
        created_at: now.clone(),
        updated_at: now,
        schedule: req.schedule,
    })
}

/// Replaces the program's attributes and its whole weekly schedule.
pub async fn update_program(
    conn: &mut SqliteConnection,
    id: &str,
    req: NewProgramRequest,
) -> Result<Option<Program>, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let updated = sqlx::query(
        r#"
        UPDATE programs
        SET name = ?1,
            monthly_price = ?2,
            per_class_price = ?3,
            classes_per_week = ?4,
            instructor = ?5,
            updated_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(&req.name)
    .bind(req.monthly_price)
    .bind(req.per_class_price)
    .bind(req.classes_per_week)
    .bind(&req.instructor)
    .bind(&now)
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    sqlx::query("DELETE FROM program_schedules WHERE program_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    insert_schedule(conn, id, &req.schedule).await?;

    find_program_by_id(conn, id).await
}

pub async fn delete_program(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM programs WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(result > 0)
}

pub async fn count_enrollments_for_program(
    conn: &mut SqliteConnection,
    program_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE program_id = ?")
        .bind(program_id)
        .fetch_one(conn)
        .await
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

pub async fn fetch_members(conn: &mut SqliteConnection) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(&format!(
        "SELECT {} FROM members ORDER BY name",
        MEMBER_COLUMNS
    ))
    .fetch_all(conn)
    .await
}

pub async fn find_member_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(&format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn insert_member(
    conn: &mut SqliteConnection,
    details: MemberDetails,
) -> Result<Member, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO members
            (id, name, gender, birth_date, age, address, phone, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
        "#,
    )
    .bind(&id)
    .bind(&details.name)
    .bind(&details.gender)
    .bind(details.birth_date)
    .bind(details.age)
    .bind(&details.address)
    .bind(&details.phone)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok(Member {
        id,
        name: details.name,
        gender: details.gender,
        birth_date: details.birth_date,
        age: details.age,
        address: details.address,
        phone: details.phone,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn update_member(
    conn: &mut SqliteConnection,
    id: &str,
    req: UpdateMemberRequest,
) -> Result<Option<Member>, sqlx::Error> {
    let mut current = match find_member_by_id(conn, id).await? {
        Some(m) => m,
        None => return Ok(None),
    };

    if let Some(name) = req.name {
        current.name = name;
    }
    if req.gender.is_some() {
        current.gender = req.gender;
    }
    if req.birth_date.is_some() {
        current.birth_date = req.birth_date;
    }
    if req.age.is_some() {
        current.age = req.age;
    }
    if req.address.is_some() {
        current.address = req.address;
    }
    if req.phone.is_some() {
        current.phone = req.phone;
    }
    current.updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE members
        SET name = ?1,
            gender = ?2,
            birth_date = ?3,
            age = ?4,
            address = ?5,
            phone = ?6,
            updated_at = ?7
        WHERE id = ?8
        "#,
    )
    .bind(&current.name)
    .bind(&current.gender)
    .bind(current.birth_date)
    .bind(current.age)
    .bind(&current.address)
    .bind(&current.phone)
    .bind(&current.updated_at)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(Some(current))
}

/// Deletes a member along with every enrollment and attendance record it owns.
pub async fn delete_member(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query(
        "DELETE FROM attendance WHERE enrollment_id IN (SELECT id FROM enrollments WHERE member_id = ?)",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM enrollments WHERE member_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(result > 0)
}

// ---------------------------------------------------------------------------
// Enrollments
// ---------------------------------------------------------------------------

pub async fn find_enrollment_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments WHERE id = ?",
        ENROLLMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn find_enrollment_for_program(
    conn: &mut SqliteConnection,
    member_id: &str,
    program_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments WHERE member_id = ? AND program_id = ?",
        ENROLLMENT_COLUMNS
    ))
    .bind(member_id)
    .bind(program_id)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_enrollments(conn: &mut SqliteConnection) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments ORDER BY start_date DESC, created_at DESC",
        ENROLLMENT_COLUMNS
    ))
    .fetch_all(conn)
    .await
}

pub async fn fetch_enrollments_for_member(
    conn: &mut SqliteConnection,
    member_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM enrollments WHERE member_id = ? ORDER BY start_date DESC, created_at DESC",
        ENROLLMENT_COLUMNS
    ))
    .bind(member_id)
    .fetch_all(conn)
    .await
}

pub async fn count_enrollments_for_member(
    conn: &mut SqliteConnection,
    member_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE member_id = ?")
        .bind(member_id)
        .fetch_one(conn)
        .await
}

pub async fn insert_enrollment(
    conn: &mut SqliteConnection,
    enrollment: &Enrollment,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO enrollments
            (id, member_id, program_id, duration_months, total_classes, purchased_classes,
            remaining_classes, total_amount, original_amount, payment_status, start_date,
            created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&enrollment.id)
    .bind(&enrollment.member_id)
    .bind(&enrollment.program_id)
    .bind(enrollment.duration_months)
    .bind(enrollment.total_classes)
    .bind(enrollment.purchased_classes)
    .bind(enrollment.remaining_classes)
    .bind(enrollment.total_amount)
    .bind(enrollment.original_amount)
    .bind(enrollment.payment_status)
    .bind(enrollment.start_date)
    .bind(&enrollment.created_at)
    .bind(&enrollment.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Overwrites the plan, balance, payment and schedule columns of an
/// enrollment. `original_amount` is left as first purchased.
pub async fn replace_enrollment(
    conn: &mut SqliteConnection,
    enrollment: &Enrollment,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE enrollments
        SET program_id = ?1,
            duration_months = ?2,
            total_classes = ?3,
            purchased_classes = ?4,
            remaining_classes = ?5,
            total_amount = ?6,
            payment_status = ?7,
            start_date = ?8,
            updated_at = ?9
        WHERE id = ?10
        "#,
    )
    .bind(&enrollment.program_id)
    .bind(enrollment.duration_months)
    .bind(enrollment.total_classes)
    .bind(enrollment.purchased_classes)
    .bind(enrollment.remaining_classes)
    .bind(enrollment.total_amount)
    .bind(enrollment.payment_status)
    .bind(enrollment.start_date)
    .bind(&enrollment.updated_at)
    .bind(&enrollment.id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(result > 0)
}

/// Adds credits and price on top of the stored balance.
pub async fn add_to_enrollment(
    conn: &mut SqliteConnection,
    id: &str,
    credits: i64,
    price: i64,
    duration_months: Option<i64>,
    total_classes: Option<i64>,
    payment_status: crate::models::PaymentStatus,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        UPDATE enrollments
        SET purchased_classes = purchased_classes + ?1,
            remaining_classes = remaining_classes + ?1,
            total_amount = total_amount + ?2,
            duration_months = ?3,
            total_classes = ?4,
            payment_status = ?5,
            updated_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(credits)
    .bind(price)
    .bind(duration_months)
    .bind(total_classes)
    .bind(payment_status)
    .bind(&now)
    .bind(id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(result > 0)
}

/// Returns `false` when the balance was already exhausted.
pub async fn decrement_remaining(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE enrollments SET remaining_classes = remaining_classes - 1, updated_at = ? WHERE id = ? AND remaining_classes > 0",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(result > 0)
}

pub async fn increment_remaining(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE enrollments SET remaining_classes = remaining_classes + 1, updated_at = ? WHERE id = ?",
    )
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(result > 0)
}

pub async fn remaining_classes(conn: &mut SqliteConnection, id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT remaining_classes FROM enrollments WHERE id = ?")
        .bind(id)
        .fetch_one(conn)
        .await
}

pub async fn delete_enrollment(conn: &mut SqliteConnection, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM enrollments WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(result > 0)
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

pub async fn find_attendance(
    conn: &mut SqliteConnection,
    enrollment_id: &str,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT id, enrollment_id, attendance_date, created_at FROM attendance WHERE enrollment_id = ? AND attendance_date = ?",
    )
    .bind(enrollment_id)
    .bind(date)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_attendance_for_enrollment(
    conn: &mut SqliteConnection,
    enrollment_id: &str,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        "SELECT id, enrollment_id, attendance_date, created_at FROM attendance WHERE enrollment_id = ? ORDER BY attendance_date",
    )
    .bind(enrollment_id)
    .fetch_all(conn)
    .await
}

pub async fn insert_attendance(
    conn: &mut SqliteConnection,
    enrollment_id: &str,
    date: NaiveDate,
) -> Result<AttendanceRecord, sqlx::Error> {
    let record = AttendanceRecord {
        id: Uuid::new_v4().to_string(),
        enrollment_id: enrollment_id.to_string(),
        attendance_date: date,
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        "INSERT INTO attendance (id, enrollment_id, attendance_date, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&record.id)
    .bind(&record.enrollment_id)
    .bind(record.attendance_date)
    .bind(&record.created_at)
    .execute(conn)
    .await?;

    Ok(record)
}

pub async fn delete_attendance(
    conn: &mut SqliteConnection,
    enrollment_id: &str,
    date: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM attendance WHERE enrollment_id = ? AND attendance_date = ?")
        .bind(enrollment_id)
        .bind(date)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(result > 0)
}

pub async fn delete_attendance_for_enrollment(
    conn: &mut SqliteConnection,
    enrollment_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM attendance WHERE enrollment_id = ?")
        .bind(enrollment_id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(result)
}

/// Everyone enrolled in a program, with their check-in state for `date`.
pub async fn fetch_roster(
    conn: &mut SqliteConnection,
    program_id: &str,
    date: NaiveDate,
) -> Result<Vec<RosterEntry>, sqlx::Error> {
    sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT
            e.id AS enrollment_id,
            m.id AS member_id,
            m.name AS member_name,
            e.remaining_classes AS remaining_classes,
            EXISTS (
                SELECT 1 FROM attendance a
                WHERE a.enrollment_id = e.id AND a.attendance_date = ?2
            ) AS is_present
        FROM enrollments e
        JOIN members m ON m.id = e.member_id
        WHERE e.program_id = ?1
        ORDER BY m.name
        "#,
    )
    .bind(program_id)
    .bind(date)
    .fetch_all(conn)
    .await
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

pub async fn fetch_sales_summary(
    conn: &mut SqliteConnection,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<SalesSummary>, sqlx::Error> {
    sqlx::query_as::<_, SalesSummary>(
        r#"
        SELECT
            p.id AS program_id,
            p.name AS program_name,
            COUNT(e.id) AS enrollment_count,
            COALESCE(SUM(e.total_amount), 0) AS gross_amount,
            COALESCE(SUM(CASE WHEN e.payment_status = 'paid' THEN e.total_amount ELSE 0 END), 0) AS paid_amount,
            COALESCE(SUM(CASE WHEN e.payment_status = 'unpaid' THEN e.total_amount ELSE 0 END), 0) AS unpaid_amount
        FROM programs p
        LEFT JOIN enrollments e
            ON e.program_id = p.id
            AND (?1 IS NULL OR e.start_date >= ?1)
            AND (?2 IS NULL OR e.start_date <= ?2)
        GROUP BY p.id, p.name
        ORDER BY p.name
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::models::PaymentStatus;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn kpop_request() -> NewProgramRequest {
        NewProgramRequest {
            name: "Kpop".to_string(),
            monthly_price: 150_000,
            per_class_price: 50_000,
            classes_per_week: 2,
            instructor: Some("Jisoo".to_string()),
            schedule: vec![
                ScheduleSlot {
                    day_of_week: "Tue".to_string(),
                    start_time: time(19, 0),
                    end_time: time(20, 30),
                },
                ScheduleSlot {
                    day_of_week: "Thu".to_string(),
                    start_time: time(19, 0),
                    end_time: time(20, 30),
                },
            ],
        }
    }

    fn sample_enrollment(member_id: &str, program_id: &str) -> Enrollment {
        let now = Utc::now().to_rfc3339();
        Enrollment {
            id: Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            program_id: program_id.to_string(),
            duration_months: Some(1),
            total_classes: None,
            purchased_classes: 8,
            remaining_classes: 8,
            total_amount: 150_000,
            original_amount: 150_000,
            payment_status: PaymentStatus::Unpaid,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_program_with_schedule() {
        let pool = setup_test_db().await;
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let program = insert_program(&mut conn, kpop_request())
            .await
            .expect("Failed to insert program");
        assert_eq!(program.schedule.len(), 2);

        let found = find_program_by_id(&mut conn, &program.id)
            .await
            .expect("Failed to fetch program")
            .expect("Program not found");
        assert_eq!(found.name, "Kpop");
        assert_eq!(found.schedule, program.schedule);

        let programs = fetch_programs(&mut conn).await.expect("Failed to fetch programs");
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].schedule.len(), 2);
    }

    #[tokio::test]
    async fn test_update_program_replaces_schedule() {
        let pool = setup_test_db().await;
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let program = insert_program(&mut conn, kpop_request())
            .await
            .expect("Failed to insert program");

        let mut req = kpop_request();
        req.classes_per_week = 1;
        req.schedule.truncate(1);
        req.monthly_price = 90_000;

        let updated = update_program(&mut conn, &program.id, req)
            .await
            .expect("Failed to update program")
            .expect("Program not found");
        assert_eq!(updated.monthly_price, 90_000);
        assert_eq!(updated.schedule.len(), 1);

        let missing = update_program(&mut conn, "nope", kpop_request())
            .await
            .expect("Failed to run update");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_balance_adjustments_never_go_negative() {
        let pool = setup_test_db().await;
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let program = insert_program(&mut conn, kpop_request()).await.unwrap();
        let member = insert_member(
            &mut conn,
            MemberDetails {
                name: "Mina".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut enrollment = sample_enrollment(&member.id, &program.id);
        enrollment.remaining_classes = 1;
        insert_enrollment(&mut conn, &enrollment).await.unwrap();

        assert!(decrement_remaining(&mut conn, &enrollment.id).await.unwrap());
        assert!(!decrement_remaining(&mut conn, &enrollment.id).await.unwrap());
        assert_eq!(remaining_classes(&mut conn, &enrollment.id).await.unwrap(), 0);

        assert!(increment_remaining(&mut conn, &enrollment.id).await.unwrap());
        assert_eq!(remaining_classes(&mut conn, &enrollment.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_attendance_unique_per_day() {
        let pool = setup_test_db().await;
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let program = insert_program(&mut conn, kpop_request()).await.unwrap();
        let member = insert_member(
            &mut conn,
            MemberDetails {
                name: "Mina".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let enrollment = sample_enrollment(&member.id, &program.id);
        insert_enrollment(&mut conn, &enrollment).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        insert_attendance(&mut conn, &enrollment.id, date).await.unwrap();
        let duplicate = insert_attendance(&mut conn, &enrollment.id, date).await;
        assert!(duplicate.is_err());

        let roster = fetch_roster(&mut conn, &program.id, date).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert!(roster[0].is_present);

        assert!(delete_attendance(&mut conn, &enrollment.id, date).await.unwrap());
        assert!(!delete_attendance(&mut conn, &enrollment.id, date).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_member_cascades() {
        let pool = setup_test_db().await;
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let program = insert_program(&mut conn, kpop_request()).await.unwrap();
        let member = insert_member(
            &mut conn,
            MemberDetails {
                name: "Mina".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let enrollment = sample_enrollment(&member.id, &program.id);
        insert_enrollment(&mut conn, &enrollment).await.unwrap();
        insert_attendance(&mut conn, &enrollment.id, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap())
            .await
            .unwrap();

        assert!(delete_member(&mut conn, &member.id).await.unwrap());
        assert!(find_enrollment_by_id(&mut conn, &enrollment.id).await.unwrap().is_none());
        assert!(fetch_attendance_for_enrollment(&mut conn, &enrollment.id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(count_enrollments_for_program(&mut conn, &program.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sales_summary_splits_paid_and_unpaid() {
        let pool = setup_test_db().await;
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let program = insert_program(&mut conn, kpop_request()).await.unwrap();
        for (name, status) in [("Mina", PaymentStatus::Paid), ("Hana", PaymentStatus::Unpaid)] {
            let member = insert_member(
                &mut conn,
                MemberDetails {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            let mut enrollment = sample_enrollment(&member.id, &program.id);
            enrollment.payment_status = status;
            insert_enrollment(&mut conn, &enrollment).await.unwrap();
        }

        let summary = fetch_sales_summary(&mut conn, None, None).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].enrollment_count, 2);
        assert_eq!(summary[0].gross_amount, 300_000);
        assert_eq!(summary[0].paid_amount, 150_000);
        assert_eq!(summary[0].unpaid_amount, 150_000);

        let later = NaiveDate::from_ymd_opt(2026, 4, 1);
        let filtered = fetch_sales_summary(&mut conn, later, None).await.unwrap();
        assert_eq!(filtered[0].enrollment_count, 0);
        assert_eq!(filtered[0].gross_amount, 0);
    }
}
