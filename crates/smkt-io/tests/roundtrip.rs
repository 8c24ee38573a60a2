//! Case file read/clear/write tests

use smkt_clear::{offers_to_case, ClearingConfig};
use smkt_io::{load_submissions, parse_case_file, parse_case_string, rewrite_case};
use std::fs;
use tempfile::tempdir;

const CASE: &str = r#"function mpc = market3
%MARKET3  Two generators and one dispatchable load

%% MATPOWER Case Format : Version 2
mpc.version = '2';

%%-----  Power Flow Data  -----%%
%% system MVA base
mpc.baseMVA = 100;

%% bus data
%	bus_i	type	Pd	Qd	Gs	Bs	area	Vm	Va	baseKV	zone	Vmax	Vmin
mpc.bus = [
	1	3	0	0	0	0	1	1	0	135	1	1.05	0.95;
	2	1	0	0	0	0	1	1	0	135	1	1.05	0.95;
];

%% generator data
%	bus	Pg	Qg	Qmax	Qmin	Vg	mBase	status	Pmax	Pmin
mpc.gen = [
	1	0	0	30	-30	1	100	1	100	0;
	2	0	0	0	0	1	100	1	0	-50;
	2	0	0	20	-20	1	100	1	80	10;
];

%% branch data
%	fbus	tbus	r	x	b	rateA	rateB	rateC	ratio	angle	status	angmin	angmax
mpc.branch = [
	1	2	0.01	0.1	0	100	100	100	0	0	1	-360	360;
];

%%-----  OPF Data  -----%%
%% generator cost data
%	1	startup	shutdown	n	x1	y1	...	xn	yn
%	2	startup	shutdown	n	c(n-1)	...	c0
mpc.gencost = [
	2	1500	0	3	0.11	5	150;
	1	0	0	2	-50	-2000	0	0;
	1	3000	100	3	10	200	40	900	80	2100;
];
"#;

#[test]
fn test_clear_and_rewrite_case() {
    let tmp = tempdir().unwrap();
    let case_path = tmp.path().join("market3.m");
    let sub_path = tmp.path().join("offers.toml");
    fs::write(&case_path, CASE).unwrap();
    fs::write(
        &sub_path,
        r#"
[offers.P]
qty = [[60.0, 20.0], [0.0, 0.0], [30.0, 0.0]]
prc = [[12.0, 18.0], [0.0, 0.0], [25.0, 0.0]]

[bids.P]
qty = [[20.0]]
prc = [[30.0]]
"#,
    )
    .unwrap();

    let case = parse_case_file(&case_path).unwrap();
    let sub = load_submissions(&sub_path).unwrap();
    assert_eq!(case.gen.len(), 3);
    assert_eq!(case.gencost.len(), 3);

    let result = offers_to_case(
        &case.gen,
        &case.gencost,
        &sub.offers,
        sub.bids.as_ref(),
        sub.limits.as_ref(),
        &ClearingConfig::default(),
    )
    .unwrap();

    let text = rewrite_case(CASE, &result.gen, &result.gencost).unwrap();
    assert!(text.contains("mpc.branch = ["));
    assert!(text.contains("%%-----  OPF Data  -----%%"));

    let cleared = parse_case_string(&text).unwrap();
    assert_eq!(cleared.gen, result.gen);
    assert_eq!(cleared.gencost, result.gencost);
    assert_eq!(cleared.gen[0].pmax, 80.0);
    assert_eq!(cleared.gen[1].pmin, -20.0);
    assert_eq!(cleared.gen[2].pmax, 30.0);
    assert_eq!(
        cleared.gencost.rows[2].breakpoints(),
        vec![(0.0, 0.0), (30.0, 750.0)]
    );
}

#[test]
fn test_missing_case_file() {
    let tmp = tempdir().unwrap();
    let err = parse_case_file(&tmp.path().join("nope.m")).unwrap_err();
    assert!(err.to_string().contains("reading MATPOWER file"));
}
