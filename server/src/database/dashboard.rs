// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Read-only aggregations behind the role dashboards and the profile page.
use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use hotel_common::attendance::summarize_month;
use hotel_common::roles::DashboardKind;
use hotel_common::{
    AttendantDashboard, Dashboard, DirectorDashboard, Employee, HousekeepingDashboard,
    HrDashboard, MaintenanceDashboard, ProfileView, ReceptionDashboard, RoleStats, RoomQuery,
    RoomStats, TeamStats, TechnicianDashboard,
};
use sqlx::SqlitePool;
use tracing::debug;

use super::attendance::{
    attendance_on_day_from_db, day_stats_from_db, month_attendance_from_db, open_attendance_from_db,
    present_count_in_db,
};
use super::cleaning::{
    cleaning_stats_from_db, cleaning_work_from_db, my_cleaning_tasks_from_db,
    unassigned_cleaning_count_in_db,
};
use super::departments::get_department_from_db;
use super::employees::count_active_employees_in_db;
use super::leaves::{leave_counts_from_db, pending_leaves_of_employee_in_db};
use super::maintenance::{
    maintenance_stats_from_db, maintenance_work_from_db, my_maintenance_from_db,
    open_maintenance_count_in_db, unassigned_maintenance_count_in_db,
    urgent_open_maintenance_from_db,
};
use super::reservations::{arrivals_from_db, departures_from_db, in_house_reservations_from_db};
use super::rooms::list_rooms_from_db;

async fn room_stats_from_db(pool: &SqlitePool) -> Result<RoomStats> {
    let rooms = list_rooms_from_db(pool, &RoomQuery::default()).await?;
    Ok(RoomStats::from_rooms(&rooms))
}

/// Builds the dashboard matching the employee's role.
pub async fn dashboard_from_db(pool: &SqlitePool, employee: &Employee, now: DateTime<Utc>) -> Result<Dashboard> {
    let today = now.date_naive();
    let kind = employee.role.dashboard();
    debug!("Building {:?} dashboard for {}", kind, employee.username);

    let dashboard = match kind {
        DashboardKind::Director => {
            let open_cleaning = cleaning_stats_from_db(pool, today).await?;
            Dashboard::Director(DirectorDashboard {
                rooms: room_stats_from_db(pool).await?,
                attendance: day_stats_from_db(pool, today, employee.role.supervised_roles()).await?,
                pending_leaves: leave_counts_from_db(pool, employee.role.supervised_roles(), today)
                    .await?
                    .pending,
                open_cleaning: open_cleaning.pending + open_cleaning.in_progress,
                open_maintenance: open_maintenance_count_in_db(pool).await?,
                arrivals_today: arrivals_from_db(pool, today).await?.len() as i64,
                departures_today: departures_from_db(pool, today).await?.len() as i64,
            })
        }
        DashboardKind::Reception => Dashboard::Reception(ReceptionDashboard {
            rooms: room_stats_from_db(pool).await?,
            arrivals_today: arrivals_from_db(pool, today).await?.into_iter().map(|r| r.view()).collect(),
            departures_today: departures_from_db(pool, today).await?.into_iter().map(|r| r.view()).collect(),
            in_house: in_house_reservations_from_db(pool).await?.len() as i64,
        }),
        DashboardKind::HousekeepingManager => {
            let rooms = room_stats_from_db(pool).await?;
            Dashboard::HousekeepingManager(HousekeepingDashboard {
                stats: cleaning_stats_from_db(pool, today).await?,
                unassigned: unassigned_cleaning_count_in_db(pool).await?,
                dirty_rooms: rooms.dirty,
                team_size: count_active_employees_in_db(pool, employee.role.supervised_roles()).await?,
            })
        }
        DashboardKind::RoomAttendant => {
            let tasks = my_cleaning_tasks_from_db(pool, employee.id).await?;
            let pending = tasks.len() as i64;
            Dashboard::RoomAttendant(AttendantDashboard { tasks, pending })
        }
        DashboardKind::MaintenanceManager => Dashboard::MaintenanceManager(MaintenanceDashboard {
            stats: maintenance_stats_from_db(pool).await?,
            unassigned: unassigned_maintenance_count_in_db(pool).await?,
            urgent_open: urgent_open_maintenance_from_db(pool).await?,
        }),
        DashboardKind::MaintenanceTechnician => Dashboard::MaintenanceTechnician(TechnicianDashboard {
            requests: my_maintenance_from_db(pool, employee.id).await?,
        }),
        DashboardKind::HumanResources => Dashboard::HumanResources(HrDashboard {
            headcount: count_active_employees_in_db(pool, employee.role.supervised_roles()).await?,
            attendance: day_stats_from_db(pool, today, employee.role.supervised_roles()).await?,
            pending_leaves: leave_counts_from_db(pool, employee.role.supervised_roles(), today)
                .await?
                .pending,
        }),
    };
    Ok(dashboard)
}

/// Work counters shown on the profile, depending on the role.
async fn role_stats_from_db(pool: &SqlitePool, employee: &Employee, now: DateTime<Utc>) -> Result<RoleStats> {
    let today = now.date_naive();
    let mut stats = RoleStats::default();
    if employee.role.is_housekeeping_staff() {
        stats.cleaning = Some(cleaning_work_from_db(pool, employee.id, today).await?);
    }
    if employee.role.is_maintenance_staff() {
        stats.maintenance = Some(maintenance_work_from_db(pool, employee.id, today).await?);
    }
    if employee.role.is_supervisor() {
        let team = employee.role.supervised_roles();
        stats.team = Some(TeamStats {
            size: count_active_employees_in_db(pool, team).await?,
            present_today: present_count_in_db(pool, today, team).await?,
            pending_leaves: leave_counts_from_db(pool, team, today).await?.pending,
        });
    }
    Ok(stats)
}

pub async fn profile_from_db(
    pool: &SqlitePool,
    employee: Employee,
    now: DateTime<Utc>,
    standard_hours: i64,
) -> Result<ProfileView> {
    let today = now.date_naive();
    let department = match employee.department_id {
        Some(id) => get_department_from_db(pool, id).await?,
        None => None,
    };
    let current_attendance = attendance_on_day_from_db(pool, employee.id, today)
        .await?
        .map(|a| a.view(now, standard_hours));
    let is_checked_in = open_attendance_from_db(pool, employee.id).await?.is_some();
    let records = month_attendance_from_db(pool, employee.id, today.year(), today.month()).await?;
    let monthly = summarize_month(&records, today.year(), today.month(), standard_hours);
    let pending_leaves = pending_leaves_of_employee_in_db(pool, employee.id).await?;
    let role_stats = role_stats_from_db(pool, &employee, now).await?;

    Ok(ProfileView {
        employee,
        department,
        current_attendance,
        is_checked_in,
        monthly,
        pending_leaves,
        role_stats,
    })
}
