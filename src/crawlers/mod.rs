pub mod bounty;
