use reserve_check::{document, extract, reserve};

fn resolve_single(xml: &str) -> Vec<reserve_check::report::SystemInfo> {
    let doc = document::parse(xml).expect("parse XML");
    extract::job_to_system_info(&doc).expect("extract")
}

const RECIPE_OPEN: &str = r#"<job id="123"><recipeSet id="456">
    <recipe id="790" system="a.example.com" arch="x86_64" distro="RHEL9" variant="Server" status="Completed">"#;
const RECIPE_CLOSE: &str = "</recipe></recipeSet></job>";

#[test]
fn no_signals_uses_recipe_status() {
    let xml = format!("{RECIPE_OPEN}{RECIPE_CLOSE}");
    let systems = resolve_single(&xml);
    assert_eq!(systems.len(), 1);
    let rec = &systems[0];
    assert_eq!(rec.id, 790);
    assert_eq!(rec.system, "a.example.com");
    assert_eq!(rec.arch, "x86_64");
    assert_eq!(rec.distro, "RHEL9");
    assert_eq!(rec.variant, "Server");
    assert_eq!(rec.reservation, "Completed");
}

#[test]
fn reservation_task_status_wins() {
    let xml = format!(
        r#"{RECIPE_OPEN}
            <task name="/distribution/install" status="Completed"/>
            <task name="/distribution/reservesys" status="Running"/>
        {RECIPE_CLOSE}"#
    );
    let systems = resolve_single(&xml);
    assert_eq!(systems[0].reservation, "Running");
}

#[test]
fn last_reservation_task_is_authoritative() {
    let xml = format!(
        r#"{RECIPE_OPEN}
            <task name="/distribution/reservesys" status="Aborted"/>
            <task name="/distribution/install" status="Completed"/>
            <task name="/distribution/reservesys" status="Running"/>
        {RECIPE_CLOSE}"#
    );
    let systems = resolve_single(&xml);
    assert_eq!(systems[0].reservation, "Running");
}

#[test]
fn marker_uses_recipe_status() {
    let xml = format!(
        r#"{RECIPE_OPEN}
            <task name="/distribution/install" status="Completed"/>
            <reservesys duration="86400"/>
        {RECIPE_CLOSE}"#
    );
    let systems = resolve_single(&xml);
    assert_eq!(systems[0].reservation, "Completed");
}

#[test]
fn both_mechanisms_report_the_ambiguity_diagnostic() {
    let xml = format!(
        r#"{RECIPE_OPEN}
            <task name="/distribution/reservesys" status="Running"/>
            <reservesys/>
        {RECIPE_CLOSE}"#
    );
    let systems = resolve_single(&xml);
    assert_eq!(
        systems[0].reservation,
        "ERROR: Looks like the recipe for this system have too many methods to reserve. \
         Do not know what happens."
    );
    assert_eq!(systems[0].reservation, reserve::AMBIGUOUS_RESERVATION);
}

#[test]
fn unrelated_tasks_do_not_count_as_reservation() {
    let xml = format!(
        r#"{RECIPE_OPEN}
            <task name="/distribution/install" status="Aborted"/>
            <task name="/kernel/perf" status="Running"/>
        {RECIPE_CLOSE}"#
    );
    let systems = resolve_single(&xml);
    assert_eq!(systems[0].reservation, "Completed");
}

#[test]
fn signals_in_guest_subtree_are_visible_to_the_host_recipe() {
    // Deep search spans the whole recipe subtree, so a reservation
    // task inside a guest also governs the hosting recipe's status.
    let xml = format!(
        r#"{RECIPE_OPEN}
            <guestrecipe id="791" system="g.example.com" arch="x86_64" distro="RHEL9" variant="Server" status="Reserved">
                <task name="/distribution/reservesys" status="Running"/>
            </guestrecipe>
        {RECIPE_CLOSE}"#
    );
    let systems = resolve_single(&xml);
    assert_eq!(systems.len(), 2);
    assert_eq!(systems[0].id, 790);
    assert_eq!(systems[0].reservation, "Running");
    assert_eq!(systems[1].id, 791);
    assert_eq!(systems[1].reservation, "Running");
}
